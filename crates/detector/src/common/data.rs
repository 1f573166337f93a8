//! Access Kinds.
//!
//! This module defines the classification of trace records. The kind decides:
//! 1. **Record Layout:** Instruction traces carry bare program counters; data traces carry a flag word.
//! 2. **Pass Selection:** Data scopes analyze reads and writes in separate passes.

/// Kind of access recorded in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Instruction fetch (program counter sample).
    InstructionFetch,

    /// Data read.
    ///
    /// Encoded as flag word `1` in data-scope records.
    Read,

    /// Data write.
    ///
    /// Encoded as flag word `0` in data-scope records.
    Write,
}

impl AccessKind {
    /// Flag word of a data-scope write record.
    pub const WRITE_FLAG: u64 = 0;
    /// Flag word of a data-scope read record.
    pub const READ_FLAG: u64 = 1;

    /// Decodes a data-scope flag word.
    ///
    /// # Returns
    ///
    /// `Some(Read)` or `Some(Write)` for the two defined flags, `None` otherwise.
    pub const fn from_data_flag(flag: u64) -> Option<Self> {
        match flag {
            Self::READ_FLAG => Some(Self::Read),
            Self::WRITE_FLAG => Some(Self::Write),
            _ => None,
        }
    }
}
