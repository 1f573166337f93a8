//! Pattern detection.
//!
//! A set is reported when its clusterer result holds strictly more entries than the
//! configured minimum recurrence; a run is positive when any set is reported.

use std::fmt;

use super::cluster::Cluster;

/// A cache set showing a recurring full-set-eviction pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSet {
    /// Cache set index.
    pub set_index: u64,
    /// Emitted clusters, chronological.
    pub clusters: Vec<Cluster>,
}

/// Applies the minimum-recurrence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternDetector {
    /// A set needs strictly more clusters than this.
    pub min_recurrence: usize,
}

impl PatternDetector {
    /// Creates a detector.
    pub const fn new(min_recurrence: usize) -> Self {
        Self { min_recurrence }
    }

    /// Returns the detected set, if `clusters` recur often enough.
    pub fn detect(&self, set_index: u64, clusters: Vec<Cluster>) -> Option<DetectedSet> {
        (clusters.len() > self.min_recurrence).then_some(DetectedSet {
            set_index,
            clusters,
        })
    }
}

/// Run-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one set was detected.
    Detected,
    /// No set was detected.
    NotDetected,
}

impl Verdict {
    /// Verdict for a list of detected sets.
    pub const fn from_detected(detected: &[DetectedSet]) -> Self {
        if detected.is_empty() {
            Self::NotDetected
        } else {
            Self::Detected
        }
    }

    /// Returns `true` for [`Verdict::Detected`].
    pub const fn is_detected(self) -> bool {
        matches!(self, Self::Detected)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Detected => "prime+probe pattern is detected!",
            Self::NotDetected => "No prime+probe pattern is detected!",
        })
    }
}
