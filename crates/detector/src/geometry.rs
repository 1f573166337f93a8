//! Cache geometry and address decoding.
//!
//! This module derives the bit layout of a set-associative cache level once per run.
//! It provides:
//! 1. **Validation:** Size, line size, ways, and sharing cores must be powers of two.
//! 2. **Decoding:** Physical address to `(set_index, tag)`, discarding line-offset bits.
//! 3. **Composition:** The inverse, used to synthesize addresses for a known set and tag.
//!
//! `set_bits` is `log2(ways * line_bytes)`, i.e. the width of one set's byte span, and the
//! tag starts `set_bits + line_bits` bits up. On levels with more sets than that span
//! covers, the high set-index bits and the low tag bits overlap. Round trips are only
//! defined for `(set_index, tag)` pairs obtained from `decode`.

use crate::common::addr::PhysAddr;
use crate::common::error::{Error, Result};
use crate::config::CacheLevelConfig;

/// Immutable bit layout and clustering thresholds of one cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    /// Number of ways per set.
    pub associativity: usize,
    /// `log2(line_bytes)`.
    pub line_bits: u32,
    /// `log2(associativity * line_bytes)`.
    pub set_bits: u32,
    /// `size / (associativity * line_bytes * cores)`; always a power of two.
    pub number_of_sets: u64,
    /// `number_of_sets - 1`.
    pub set_index_mask: u64,
    /// Max index gap between consecutive members of one cluster.
    pub intra_group_threshold: u64,
    /// Max centroid distance of a recurring cluster pair, if pairing is enabled.
    pub inter_group_threshold: Option<u64>,
}

/// Checks that a geometry parameter is a positive power of two.
fn power_of_two(param: &'static str, value: usize) -> Result<u64> {
    if value.is_power_of_two() {
        Ok(value as u64)
    } else {
        Err(Error::Config {
            param,
            value: value as u64,
            reason: "must be a positive power of two",
        })
    }
}

impl CacheGeometry {
    /// Derives the geometry of a cache level.
    ///
    /// # Arguments
    ///
    /// * `level` - Size, line size, associativity, sharing cores, and thresholds.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if any size parameter is zero or not a power of two, if the
    /// level is too small to hold a single set per core, or if the intra-group
    /// threshold is zero.
    pub fn new(level: &CacheLevelConfig) -> Result<Self> {
        let size = power_of_two("size_bytes", level.size_bytes)?;
        let line = power_of_two("line_bytes", level.line_bytes)?;
        let ways = power_of_two("ways", level.ways)?;
        let cores = power_of_two("cores", level.cores)?;

        let set_span = ways.checked_mul(line).ok_or(Error::Config {
            param: "ways",
            value: ways,
            reason: "ways * line_bytes overflows",
        })?;
        let per_core_span = set_span.checked_mul(cores).ok_or(Error::Config {
            param: "cores",
            value: cores,
            reason: "ways * line_bytes * cores overflows",
        })?;
        let number_of_sets = size / per_core_span;
        if number_of_sets == 0 {
            return Err(Error::Config {
                param: "size_bytes",
                value: size,
                reason: "smaller than one set per sharing core",
            });
        }

        if level.intra_group_threshold == 0 {
            return Err(Error::Config {
                param: "intra_group_threshold",
                value: 0,
                reason: "must be at least 1",
            });
        }

        Ok(Self {
            associativity: level.ways,
            line_bits: line.trailing_zeros(),
            set_bits: set_span.trailing_zeros(),
            number_of_sets,
            set_index_mask: number_of_sets - 1,
            intra_group_threshold: level.intra_group_threshold,
            inter_group_threshold: level.inter_group_threshold,
        })
    }

    /// Shift that isolates the tag.
    #[inline(always)]
    const fn tag_shift(&self) -> u32 {
        self.set_bits + self.line_bits
    }

    /// Cache set index of `addr`.
    #[inline(always)]
    pub const fn set_index(&self, addr: PhysAddr) -> u64 {
        (addr.0 >> self.line_bits) & self.set_index_mask
    }

    /// Tag of `addr`.
    #[inline(always)]
    pub const fn tag(&self, addr: PhysAddr) -> u64 {
        match addr.0.checked_shr(self.tag_shift()) {
            Some(tag) => tag,
            None => 0,
        }
    }

    /// Decodes an address into `(set_index, tag)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ppscan_core::common::PhysAddr;
    /// use ppscan_core::config::CacheLevelConfig;
    /// use ppscan_core::CacheGeometry;
    ///
    /// let geometry = CacheGeometry::new(&CacheLevelConfig::l1()).unwrap();
    /// assert_eq!(geometry.decode(PhysAddr(0x40_1040)), (1, 0x80));
    /// ```
    #[inline]
    pub const fn decode(&self, addr: PhysAddr) -> (u64, u64) {
        (self.set_index(addr), self.tag(addr))
    }

    /// Rebuilds an address from a decoded `(set_index, tag)` pair and a line offset.
    ///
    /// Offset bits beyond the line are dropped.
    pub const fn compose(&self, tag: u64, set_index: u64, offset: u64) -> PhysAddr {
        let line_mask = (1u64 << self.line_bits) - 1;
        let tag_part = match tag.checked_shl(self.tag_shift()) {
            Some(part) => part,
            None => 0,
        };
        let set_part = (set_index & self.set_index_mask) << self.line_bits;
        PhysAddr(tag_part | set_part | (offset & line_mask))
    }
}
