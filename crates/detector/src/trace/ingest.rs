//! Binary trace ingestion.
//!
//! Files are read in one piece and validated before any record is decoded, so a
//! truncated trace never yields a partial event list.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::{AccessEvent, RecordLayout, Trace, WORD_BYTES};
use crate::common::addr::PhysAddr;
use crate::common::data::AccessKind;
use crate::common::error::{Error, Result};

/// Reads the native-endian word at `word` within `record`.
#[inline(always)]
fn word(record: &[u8], word: usize) -> u64 {
    let mut bytes = [0u8; WORD_BYTES];
    bytes.copy_from_slice(&record[word * WORD_BYTES..(word + 1) * WORD_BYTES]);
    u64::from_ne_bytes(bytes)
}

/// Parses a trace held in memory.
///
/// # Arguments
///
/// * `bytes` - Raw trace contents.
/// * `layout` - Record layout of the trace.
///
/// # Returns
///
/// The decoded events with `sequence_index` set to each record's ordinal.
///
/// # Errors
///
/// [`Error::MalformedRecord`] if `bytes.len()` is not a multiple of the record size.
pub fn parse_records(bytes: &[u8], layout: RecordLayout) -> Result<Trace> {
    let record_size = layout.record_size();
    if bytes.len() % record_size != 0 {
        return Err(Error::MalformedRecord {
            len: bytes.len(),
            record_size,
        });
    }

    let records = bytes.chunks_exact(record_size);
    let mut trace = Trace {
        events: Vec::with_capacity(records.len()),
        records: records.len() as u64,
        skipped: 0,
    };

    for (ordinal, record) in records.enumerate() {
        let sequence_index = ordinal as u64;
        let event = match layout {
            RecordLayout::Instruction => Some(AccessEvent {
                sequence_index,
                kind: AccessKind::InstructionFetch,
                physical_address: PhysAddr(word(record, 0)),
            }),
            RecordLayout::Data => {
                AccessKind::from_data_flag(word(record, 0)).map(|kind| AccessEvent {
                    sequence_index,
                    kind,
                    physical_address: PhysAddr(word(record, 1)),
                })
            }
        };
        match event {
            Some(event) => trace.events.push(event),
            None => trace.skipped += 1,
        }
    }

    if trace.skipped > 0 {
        warn!(
            skipped = trace.skipped,
            records = trace.records,
            "data records with an unknown read/write flag were ignored"
        );
    }
    Ok(trace)
}

/// Loads and parses a trace file.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, [`Error::MalformedRecord`] if it is truncated.
pub fn load_trace(path: impl AsRef<Path>, layout: RecordLayout) -> Result<Trace> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), ?layout, "loaded trace");
    parse_records(&bytes, layout)
}
