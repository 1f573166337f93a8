//! Set grouping and unique-line filtering.
//!
//! Grouping is a stable partition: accesses keep the order they are fed in, which is
//! trace order. The filter drops groups that touch fewer distinct lines than the
//! cache has ways, since they cannot evict a full set.

use std::collections::{BTreeMap, HashSet};

use super::DecodedAccess;

/// All accesses to one cache set, in trace order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetGroup {
    /// Cache set index shared by every access.
    pub set_index: u64,
    /// Accesses ascending by `sequence_index`.
    pub accesses: Vec<DecodedAccess>,
}

impl SetGroup {
    /// Creates an empty group for `set_index`.
    pub const fn new(set_index: u64) -> Self {
        Self {
            set_index,
            accesses: Vec::new(),
        }
    }

    /// Number of distinct tags (lines) touched by the group.
    pub fn distinct_tags(&self) -> usize {
        self.accesses
            .iter()
            .map(|a| a.tag)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Appends a later group of the same set.
    ///
    /// `other` must hold accesses that come after every access already in `self`.
    pub fn append(&mut self, other: &mut Self) {
        debug_assert_eq!(self.set_index, other.set_index);
        self.accesses.append(&mut other.accesses);
    }
}

/// Groups decoded accesses by cache set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetGrouper;

impl SetGrouper {
    /// Partitions `accesses` by set index.
    ///
    /// # Returns
    ///
    /// One group per set present, ascending by set index. Within a group, accesses
    /// appear in the order they were yielded.
    pub fn group<I>(accesses: I) -> Vec<SetGroup>
    where
        I: IntoIterator<Item = DecodedAccess>,
    {
        let mut groups: BTreeMap<u64, SetGroup> = BTreeMap::new();
        for access in accesses {
            groups
                .entry(access.set_index)
                .or_insert_with(|| SetGroup::new(access.set_index))
                .accesses
                .push(access);
        }
        groups.into_values().collect()
    }
}

/// Keeps only groups with at least `min_distinct_tags` distinct lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueLineFilter {
    /// Minimum distinct tags; the associativity of the analyzed level.
    pub min_distinct_tags: usize,
}

impl UniqueLineFilter {
    /// Creates a filter requiring `associativity` distinct lines.
    pub const fn new(associativity: usize) -> Self {
        Self {
            min_distinct_tags: associativity,
        }
    }

    /// Whether `group` could witness a full-set eviction.
    pub fn retains(&self, group: &SetGroup) -> bool {
        group.distinct_tags() >= self.min_distinct_tags
    }

    /// Drops every group that [`retains`](Self::retains) rejects.
    pub fn apply(&self, groups: Vec<SetGroup>) -> Vec<SetGroup> {
        groups.into_iter().filter(|g| self.retains(g)).collect()
    }
}
