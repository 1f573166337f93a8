//! Prime+Probe analysis.
//!
//! This module turns decoded accesses into per-set verdicts. It is organized in stages:
//! 1. **Grouping:** Partition accesses by cache set without reordering them.
//! 2. **Filtering:** Drop sets that never touch enough distinct lines to evict a full set.
//! 3. **Clustering:** Fold each set's accesses into temporally bounded clusters.
//! 4. **Detection:** Report sets whose qualifying clusters recur often enough.
//! 5. **Pipeline:** Run stages 1–4 for every set on a rayon worker pool.

/// Temporal clustering of per-set access sequences.
pub mod cluster;
/// Recurrence threshold and run-level verdict.
pub mod detect;
/// Set grouping and unique-line filtering.
pub mod group;
/// Parallel map / shuffle / reduce / collect over cache sets.
pub mod pipeline;

use std::fmt;

use crate::common::addr::PhysAddr;
use crate::common::data::AccessKind;
use crate::config::{Mode, Scope};
use crate::geometry::CacheGeometry;
use crate::trace::AccessEvent;

pub use cluster::{Centroid, Cluster, ClusterAccumulator, ClusterParams, RecurrenceSelector, Sample};
pub use detect::{DetectedSet, PatternDetector, Verdict};
pub use group::{SetGroup, SetGrouper, UniqueLineFilter};

/// An access resolved to its cache set and tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAccess {
    /// Cache set index.
    pub set_index: u64,
    /// Line tag within the set.
    pub tag: u64,
    /// Record ordinal of the access.
    pub sequence_index: u64,
    /// Original address (program counter for instruction traces).
    pub physical_address: PhysAddr,
}

impl DecodedAccess {
    /// Decodes a trace event under `geometry`.
    #[inline]
    pub const fn new(event: &AccessEvent, geometry: &CacheGeometry) -> Self {
        let (set_index, tag) = geometry.decode(event.physical_address);
        Self {
            set_index,
            tag,
            sequence_index: event.sequence_index,
            physical_address: event.physical_address,
        }
    }

    /// The `(sequence_index, tag)` pair consumed by the clusterer.
    #[inline]
    pub const fn sample(&self) -> Sample {
        Sample {
            index: self.sequence_index,
            tag: self.tag,
        }
    }
}

/// One filtered pass over a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Instruction fetches (`L1I`).
    Instruction,
    /// Data reads (`L1D`/`LLC`).
    Read,
    /// Data writes (`L1D`/`LLC`).
    Write,
}

impl Pass {
    /// Access kind selected by the pass.
    pub const fn kind(self) -> AccessKind {
        match self {
            Self::Instruction => AccessKind::InstructionFetch,
            Self::Read => AccessKind::Read,
            Self::Write => AccessKind::Write,
        }
    }

    /// Passes to run for a scope and mode, in report order.
    ///
    /// Instruction scope ignores `mode`.
    pub fn for_scope(scope: Scope, mode: Mode) -> Vec<Self> {
        if !scope.is_data() {
            return vec![Self::Instruction];
        }
        let mut passes = Vec::with_capacity(2);
        if mode.reads() {
            passes.push(Self::Read);
        }
        if mode.writes() {
            passes.push(Self::Write);
        }
        passes
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instruction => "L1I",
            Self::Read => "Data cache read mode",
            Self::Write => "Data cache write mode",
        })
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassAnalysis {
    /// Which accesses were analyzed.
    pub pass: Pass,
    /// Detected sets, ascending by set index.
    pub detected: Vec<DetectedSet>,
}

impl PassAnalysis {
    /// Verdict of this pass.
    pub fn verdict(&self) -> Verdict {
        Verdict::from_detected(&self.detected)
    }
}
