//! Parallel Analysis Pipeline.
//!
//! This module runs the per-set analysis on a rayon worker pool, in the shape of a
//! map-reduce job:
//! 1. **Map:** Filter events by access kind and decode them (order-preserving).
//! 2. **Shuffle:** Move the decoded accesses out in contiguous chunks, group each chunk by set,
//!    and route every group to the partition owning its set (`set_index % partitions`).
//! 3. **Reduce:** Each partition concatenates its groups in chunk order, which restores trace
//!    order per set, then filters, clusters, and detects every set it owns.
//! 4. **Collect:** Partition results are merged and sorted by set index.
//!
//! Each set is owned by exactly one partition, so reductions share no mutable state and the
//! output does not depend on the partition count.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info};

use super::cluster::{ClusterParams, Sample, cluster_samples};
use super::detect::{DetectedSet, PatternDetector};
use super::group::{SetGroup, SetGrouper, UniqueLineFilter};
use super::{DecodedAccess, Pass, PassAnalysis};
use crate::common::data::AccessKind;
use crate::common::error::Result;
use crate::config::{Config, Mode, Scope};
use crate::geometry::CacheGeometry;
use crate::trace::{AccessEvent, Trace};

/// Decoded accesses per map-side chunk.
const CHUNK_ACCESSES: usize = 1 << 16;

/// Groups routed to each partition by one chunk.
type Buckets = Vec<Vec<SetGroup>>;

/// Analysis job for one cache level.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    geometry: CacheGeometry,
    params: ClusterParams,
    filter: UniqueLineFilter,
    detector: PatternDetector,
    partitions: usize,
    chunk_accesses: usize,
}

impl Pipeline {
    /// Creates a pipeline with one partition per rayon worker.
    pub fn new(geometry: CacheGeometry, min_recurrence: usize) -> Self {
        Self {
            params: ClusterParams::from(&geometry),
            filter: UniqueLineFilter::new(geometry.associativity),
            detector: PatternDetector::new(min_recurrence),
            partitions: rayon::current_num_threads().max(1),
            chunk_accesses: CHUNK_ACCESSES,
            geometry,
        }
    }

    /// Builds the pipeline for `scope` from a configuration.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Config`] if the scope's cache level is invalid.
    pub fn from_config(config: &Config, scope: Scope) -> Result<Self> {
        Ok(Self::new(config.geometry(scope)?, config.min_recurrence))
    }

    /// Fixes the number of reduce partitions (at least one).
    #[must_use]
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    /// Fixes the number of decoded accesses grouped per map-side chunk (at least one).
    #[must_use]
    pub fn with_chunk_accesses(mut self, chunk_accesses: usize) -> Self {
        self.chunk_accesses = chunk_accesses.max(1);
        self
    }

    /// The geometry every stage decodes with.
    pub const fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Number of reduce partitions.
    pub const fn partitions(&self) -> usize {
        self.partitions
    }

    /// Map stage: keeps events of `kind` and decodes them, in trace order.
    pub fn decode_events(&self, events: &[AccessEvent], kind: AccessKind) -> Vec<DecodedAccess> {
        events
            .par_iter()
            .filter(|event| event.kind == kind)
            .map(|event| DecodedAccess::new(event, &self.geometry))
            .collect()
    }

    /// Partition owning `set_index`.
    #[inline]
    const fn owner(&self, set_index: u64) -> usize {
        (set_index % self.partitions as u64) as usize
    }

    /// Shuffle stage: moves every set's accesses into the partition that owns it.
    ///
    /// `decoded` is consumed chunk by chunk, so the flat vector is gone once the
    /// groups are built.
    ///
    /// # Returns
    ///
    /// One entry per partition, each holding its sets ascending by index with
    /// accesses in trace order.
    pub fn shuffle(&self, decoded: Vec<DecodedAccess>) -> Vec<Vec<SetGroup>> {
        let chunks: Vec<Buckets> = decoded
            .into_par_iter()
            .chunks(self.chunk_accesses)
            .map(|chunk| {
                let mut buckets: Buckets = vec![Vec::new(); self.partitions];
                for group in SetGrouper::group(chunk) {
                    buckets[self.owner(group.set_index)].push(group);
                }
                buckets
            })
            .collect();

        let mut routed: Vec<Vec<Vec<SetGroup>>> = (0..self.partitions)
            .map(|_| Vec::with_capacity(chunks.len()))
            .collect();
        for buckets in chunks {
            for (partition, groups) in buckets.into_iter().enumerate() {
                routed[partition].push(groups);
            }
        }

        routed
            .into_par_iter()
            .map(|per_chunk| {
                let mut merged: BTreeMap<u64, SetGroup> = BTreeMap::new();
                for groups in per_chunk {
                    for mut group in groups {
                        merged
                            .entry(group.set_index)
                            .or_insert_with(|| SetGroup::new(group.set_index))
                            .append(&mut group);
                    }
                }
                merged.into_values().collect()
            })
            .collect()
    }

    /// Reduce step for one set: filter, cluster, detect.
    pub fn reduce_set(&self, group: &SetGroup) -> Option<DetectedSet> {
        if !self.filter.retains(group) {
            return None;
        }
        let samples: Vec<Sample> = group.accesses.iter().map(DecodedAccess::sample).collect();
        let clusters = cluster_samples(&samples, &self.params);
        let detected = self.detector.detect(group.set_index, clusters);
        if let Some(set) = &detected {
            debug!(
                set = set.set_index,
                clusters = set.clusters.len(),
                accesses = group.accesses.len(),
                "set detected"
            );
        }
        detected
    }

    /// Runs map, shuffle, reduce, and collect for one access kind.
    ///
    /// # Returns
    ///
    /// Detected sets ascending by set index.
    pub fn run(&self, events: &[AccessEvent], kind: AccessKind) -> Vec<DetectedSet> {
        let decoded = self.decode_events(events, kind);
        let accesses = decoded.len();
        let partitions = self.shuffle(decoded);

        let mut detected: Vec<DetectedSet> = partitions
            .into_par_iter()
            .flat_map_iter(|groups| {
                groups
                    .into_iter()
                    .filter_map(|group| self.reduce_set(&group))
                    .collect::<Vec<_>>()
            })
            .collect();
        detected.sort_unstable_by_key(|set| set.set_index);

        info!(
            ?kind,
            accesses,
            partitions = self.partitions,
            detected = detected.len(),
            "pass complete"
        );
        detected
    }

    /// Runs every pass `scope` and `mode` call for over a trace.
    pub fn analyze(&self, trace: &Trace, scope: Scope, mode: Mode) -> Vec<PassAnalysis> {
        Pass::for_scope(scope, mode)
            .into_iter()
            .map(|pass| PassAnalysis {
                pass,
                detected: self.run(&trace.events, pass.kind()),
            })
            .collect()
    }
}
