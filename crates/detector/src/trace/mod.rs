//! Trace records and ingestion.
//!
//! This module turns flat binary traces into ordered access events. It provides:
//! 1. **Layouts:** 8-byte instruction records and 16-byte flagged data records.
//! 2. **Events:** `AccessEvent`s numbered by their record ordinal.
//! 3. **Ingestion:** Whole-file parsing that rejects truncated traces up front.

/// Binary record parsing and file loading.
pub mod ingest;

use crate::common::addr::PhysAddr;
use crate::common::data::AccessKind;

pub use ingest::{load_trace, parse_records};

/// Size of one record field in bytes.
pub const WORD_BYTES: usize = 8;

/// Record layout of a trace file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// One native-endian `u64` program counter per record.
    Instruction,
    /// Two native-endian `u64` words per record: read/write flag, then address.
    Data,
}

impl RecordLayout {
    /// Number of bytes per record.
    pub const fn record_size(self) -> usize {
        match self {
            Self::Instruction => WORD_BYTES,
            Self::Data => 2 * WORD_BYTES,
        }
    }
}

/// A single access taken from a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessEvent {
    /// 0-based record ordinal; the time proxy for clustering.
    pub sequence_index: u64,
    /// Fetch, read, or write.
    pub kind: AccessKind,
    /// Accessed physical address (program counter for fetches).
    pub physical_address: PhysAddr,
}

/// Events parsed from one trace, in record order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    /// Access events, ascending by `sequence_index`.
    pub events: Vec<AccessEvent>,
    /// Number of records in the file, including skipped ones.
    pub records: u64,
    /// Data records whose flag word was neither read nor write.
    pub skipped: u64,
}

impl Trace {
    /// Returns `true` if the trace holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
