//! Temporal Clustering.
//!
//! This module folds one cache set's ordered accesses into temporally bounded clusters,
//! the candidate probing rounds of a Prime+Probe attack. It performs:
//! 1. **Accumulation:** Consecutive accesses closer than the intra-group threshold join the open cluster.
//! 2. **Qualification:** A closed cluster that touched at least `associativity` distinct lines is a
//!    full-set-eviction witness; anything smaller is dropped.
//! 3. **Selection:** With an inter-group threshold, only qualifying clusters that have a close
//!    predecessor or successor (a recurring pair) are kept.
//!
//! The fold is pure: `ClusterAccumulator::step` consumes the accumulator and returns the next one
//! plus the cluster it closed, if that cluster qualified.
//!
//! Two quirks are kept on purpose and pinned by tests. A zero gap (repeated or non-advancing
//! sequence index) neither joins nor closes the open cluster. The result is a set of
//! `(distinct_tags, centroid)` pairs, so two different rounds that agree on both values collapse
//! into one entry.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::geometry::CacheGeometry;

/// A `(sequence_index, tag)` pair of one access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Record ordinal; the time proxy.
    pub index: u64,
    /// Line tag.
    pub tag: u64,
}

impl Sample {
    /// Creates a sample.
    pub const fn new(index: u64, tag: u64) -> Self {
        Self { index, tag }
    }
}

/// Clusterer inputs taken from the cache geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterParams {
    /// Distinct lines a cluster needs to qualify.
    pub associativity: usize,
    /// Gaps at or above this close the open cluster.
    pub intra_group_threshold: u64,
    /// Max centroid distance of a recurring pair; `None` keeps every qualifying cluster.
    pub inter_group_threshold: Option<u64>,
}

impl From<&CacheGeometry> for ClusterParams {
    fn from(geometry: &CacheGeometry) -> Self {
        Self {
            associativity: geometry.associativity,
            intra_group_threshold: geometry.intra_group_threshold,
            inter_group_threshold: geometry.inter_group_threshold,
        }
    }
}

/// Exact mean of a cluster's member sequence indices.
///
/// Comparisons are by rational value, so `6/3 == 4/2`.
#[derive(Debug, Clone, Copy)]
pub struct Centroid {
    index_sum: u128,
    members: u64,
}

impl Centroid {
    /// Creates the centroid `index_sum / members`.
    ///
    /// A zero member count is treated as one.
    pub const fn new(index_sum: u128, members: u64) -> Self {
        Self {
            index_sum,
            members: if members == 0 { 1 } else { members },
        }
    }

    /// Number of accesses averaged.
    pub const fn members(&self) -> u64 {
        self.members
    }

    /// Integer part and remainder of the mean.
    const fn split(&self) -> (u128, u128) {
        let members = self.members as u128;
        (self.index_sum / members, self.index_sum % members)
    }

    /// Returns `true` if the mean is a whole number.
    pub const fn is_integral(&self) -> bool {
        self.split().1 == 0
    }

    /// Approximate value of the mean.
    pub fn as_f64(&self) -> f64 {
        let (whole, rem) = self.split();
        whole as f64 + rem as f64 / self.members as f64
    }

    /// Returns `true` if `|self - other| <= threshold`, computed exactly.
    pub fn within(&self, other: &Self, threshold: u64) -> bool {
        let (hi, lo) = if self >= other { (self, other) } else { (other, self) };
        let (hi_whole, hi_rem) = hi.split();
        let (lo_whole, lo_rem) = lo.split();
        let whole_gap = hi_whole - lo_whole;
        let threshold = u128::from(threshold);
        // Fractional parts are both in [0, 1): the distance is whole_gap plus a value in (-1, 1).
        let hi_frac = hi_rem * u128::from(lo.members);
        let lo_frac = lo_rem * u128::from(hi.members);
        match hi_frac.cmp(&lo_frac) {
            Ordering::Greater => whole_gap < threshold,
            Ordering::Equal | Ordering::Less => whole_gap <= threshold,
        }
    }
}

impl PartialEq for Centroid {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Centroid {}

impl PartialOrd for Centroid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Centroid {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_whole, a_rem) = self.split();
        let (b_whole, b_rem) = other.split();
        a_whole.cmp(&b_whole).then_with(|| {
            (a_rem * u128::from(other.members)).cmp(&(b_rem * u128::from(self.members)))
        })
    }
}

impl fmt::Display for Centroid {
    /// Whole means print as integers, others with three decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integral() {
            write!(f, "{}", self.split().0)
        } else {
            write!(f, "{:.3}", self.as_f64())
        }
    }
}

/// A closed cluster: how many lines it touched and when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    /// Distinct tags among the members.
    pub distinct_tags: usize,
    /// Mean sequence index of the members.
    pub centroid: Centroid,
}

impl PartialOrd for Cluster {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cluster {
    /// Chronological, then by line count.
    fn cmp(&self, other: &Self) -> Ordering {
        self.centroid
            .cmp(&other.centroid)
            .then_with(|| self.distinct_tags.cmp(&other.distinct_tags))
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.distinct_tags, self.centroid)
    }
}

/// State of the open cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAccumulator {
    member_tags: HashSet<u64>,
    index_sum: u128,
    member_count: u64,
}

impl ClusterAccumulator {
    /// Opens a cluster at `index`.
    ///
    /// The seed counts toward the centroid; its tag is added only if a later sample joins.
    pub fn seed(index: u64) -> Self {
        Self {
            member_tags: HashSet::new(),
            index_sum: u128::from(index),
            member_count: 1,
        }
    }

    /// Distinct tags collected so far.
    pub fn distinct_tags(&self) -> usize {
        self.member_tags.len()
    }

    /// Accesses counted so far, including the seed.
    pub const fn member_count(&self) -> u64 {
        self.member_count
    }

    /// Folds one sample into the accumulator.
    ///
    /// # Arguments
    ///
    /// * `prev` - The sample before `cur` in the set's sequence.
    /// * `cur` - The sample being folded.
    /// * `is_last` - Whether `cur` is the final sample of the set.
    /// * `params` - Associativity and intra-group threshold.
    ///
    /// # Returns
    ///
    /// The next accumulator and, if the open cluster closed and qualified, that cluster.
    pub fn step(
        mut self,
        prev: Sample,
        cur: Sample,
        is_last: bool,
        params: &ClusterParams,
    ) -> (Self, Option<Cluster>) {
        let gap = cur.index.saturating_sub(prev.index);

        if gap > 0 && gap < params.intra_group_threshold {
            self.member_tags.extend([prev.tag, cur.tag]);
            self.index_sum += u128::from(cur.index);
            self.member_count += 1;
        }

        if gap >= params.intra_group_threshold || is_last {
            let closed = self.close(params.associativity);
            (Self::seed(cur.index), closed)
        } else {
            (self, None)
        }
    }

    /// Closes the cluster, keeping it only if it covers a full set.
    fn close(self, associativity: usize) -> Option<Cluster> {
        let distinct_tags = self.member_tags.len();
        (distinct_tags >= associativity).then(|| Cluster {
            distinct_tags,
            centroid: Centroid::new(self.index_sum, self.member_count),
        })
    }
}

/// Chooses which qualifying clusters make it into a set's result.
#[derive(Debug, Clone, Default)]
pub struct RecurrenceSelector {
    inter_group_threshold: Option<u64>,
    pending: Option<Cluster>,
    emitted: BTreeSet<Cluster>,
}

impl RecurrenceSelector {
    /// Creates a selector; `None` emits every offered cluster.
    pub const fn new(inter_group_threshold: Option<u64>) -> Self {
        Self {
            inter_group_threshold,
            pending: None,
            emitted: BTreeSet::new(),
        }
    }

    /// Offers the next qualifying cluster, in closing order.
    ///
    /// With a threshold, a cluster within range of the pending one emits both. The
    /// pending cluster always advances to the newest one, so a later distant cluster
    /// never removes an earlier pair.
    pub fn offer(&mut self, cluster: Cluster) {
        let Some(threshold) = self.inter_group_threshold else {
            let _ = self.emitted.insert(cluster);
            return;
        };
        if let Some(pending) = self.pending.replace(cluster)
            && pending.centroid.within(&cluster.centroid, threshold)
        {
            self.emitted.extend([pending, cluster]);
        }
    }

    /// Emitted clusters, deduplicated by `(distinct_tags, centroid)`, in chronological order.
    pub fn finish(self) -> Vec<Cluster> {
        self.emitted.into_iter().collect()
    }
}

/// Clusters one set's ordered samples.
///
/// Fewer than two samples yield nothing: the single open cluster has no tags.
///
/// # Examples
///
/// ```
/// use ppscan_core::analysis::{cluster::cluster_samples, ClusterParams, Sample};
///
/// let params = ClusterParams {
///     associativity: 2,
///     intra_group_threshold: 100,
///     inter_group_threshold: None,
/// };
/// let samples: Vec<Sample> = [0, 1, 2, 1000, 1001, 1002]
///     .iter()
///     .enumerate()
///     .map(|(i, &index)| Sample::new(index, i as u64))
///     .collect();
///
/// let clusters = cluster_samples(&samples, &params);
/// assert_eq!(clusters.len(), 2);
/// assert_eq!(clusters[0].centroid.to_string(), "1");
/// assert_eq!(clusters[1].centroid.to_string(), "1001");
/// ```
pub fn cluster_samples(samples: &[Sample], params: &ClusterParams) -> Vec<Cluster> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    let last_step = samples.len().saturating_sub(2);

    let (_, selector) = samples.windows(2).enumerate().fold(
        (
            ClusterAccumulator::seed(first.index),
            RecurrenceSelector::new(params.inter_group_threshold),
        ),
        |(acc, mut selector), (step, pair)| {
            let (acc, closed) = acc.step(pair[0], pair[1], step == last_step, params);
            if let Some(cluster) = closed {
                selector.offer(cluster);
            }
            (acc, selector)
        },
    );
    selector.finish()
}
