//! Error definitions.
//!
//! Every failure is fatal for the run: there is no partial decode and no retry.
//! Re-running on the same input is the recovery path.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the crate [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring, ingesting, or reporting.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid cache geometry or analysis parameter.
    #[error("invalid configuration: {param} = {value}: {reason}")]
    Config {
        /// Name of the offending parameter.
        param: &'static str,
        /// Value that was rejected.
        value: u64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Configuration file is not valid JSON for [`crate::Config`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Trace length is not a whole number of records.
    #[error("malformed trace: {len} bytes is not a multiple of the {record_size}-byte record size")]
    MalformedRecord {
        /// Total trace length in bytes.
        len: usize,
        /// Expected record size in bytes.
        record_size: usize,
    },

    /// Input could not be read or the report could not be written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Builds an [`Error::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
