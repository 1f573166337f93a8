//! Configuration for the detector.
//!
//! This module defines all configuration structures and enums used to parameterize
//! an analysis run. It provides:
//! 1. **Defaults:** Baseline cache constants for a private L1 and a shared last-level cache.
//! 2. **Structures:** Per-level cache parameters and the root `Config`.
//! 3. **Enums:** Analysis scope (`L1I`, `L1D`, `LLC`) and data pass mode (`READ`, `WRITE`, `BOTH`).
//!
//! Configuration is supplied as JSON (`--config` on the CLI) or built with `Config::default()`.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::common::error::{Error, Result};
use crate::geometry::CacheGeometry;
use crate::trace::RecordLayout;

/// Default configuration constants.
///
/// These values describe the machine the detector was first calibrated on
/// (32 KiB 8-way L1, 8 MiB 16-way LLC shared by 4 physical cores).
mod defaults {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    /// L1 cache size in bytes.
    pub const L1_SIZE: usize = 32 * KB;
    /// L1 line size in bytes.
    pub const L1_LINE: usize = 64;
    /// L1 associativity.
    pub const L1_WAYS: usize = 8;
    /// Max index gap between accesses of one L1 probing round.
    pub const L1_INTRA_GROUP_THRESHOLD: u64 = 2;
    /// Max centroid distance between two recurring L1 rounds.
    pub const L1_INTER_GROUP_THRESHOLD: u64 = 3600;

    /// Last-level cache size in bytes.
    pub const LLC_SIZE: usize = 8 * MB;
    /// Last-level cache line size in bytes.
    pub const LLC_LINE: usize = 64;
    /// Last-level cache associativity.
    pub const LLC_WAYS: usize = 16;
    /// Physical cores sharing the last-level cache.
    pub const LLC_CORES: usize = 4;
    /// Max index gap between accesses of one LLC probing round.
    pub const LLC_INTRA_GROUP_THRESHOLD: u64 = 24;
    /// Max centroid distance between two recurring LLC rounds.
    pub const LLC_INTER_GROUP_THRESHOLD: u64 = 10000;

    /// Private caches are not shared.
    pub const PRIVATE_CORES: usize = 1;

    /// A set must show more than this many qualifying clusters to be reported.
    pub const MIN_RECURRENCE: usize = 1;
}

/// Cache level and access stream under analysis.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// L1 instruction cache; the trace holds program counters.
    L1I,
    /// L1 data cache; the trace holds flagged data addresses.
    L1D,
    /// Shared last-level cache; the trace holds flagged data addresses.
    LLC,
}

impl Scope {
    /// Record layout of traces captured for this scope.
    pub const fn layout(self) -> RecordLayout {
        match self {
            Self::L1I => RecordLayout::Instruction,
            Self::L1D | Self::LLC => RecordLayout::Data,
        }
    }

    /// Whether the scope analyzes data reads/writes (and therefore honors [`Mode`]).
    pub const fn is_data(self) -> bool {
        matches!(self, Self::L1D | Self::LLC)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::L1I => "L1I",
            Self::L1D => "L1D",
            Self::LLC => "LLC",
        })
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L1I" => Ok(Self::L1I),
            "L1D" => Ok(Self::L1D),
            "LLC" => Ok(Self::LLC),
            other => Err(format!("unknown scope '{other}' (expected L1I, L1D or LLC)")),
        }
    }
}

/// Which data accesses are analyzed for `L1D`/`LLC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Reads only.
    Read,
    /// Writes only.
    Write,
    /// A read pass followed by a write pass.
    #[default]
    Both,
}

impl Mode {
    /// Whether the read pass runs.
    pub const fn reads(self) -> bool {
        matches!(self, Self::Read | Self::Both)
    }

    /// Whether the write pass runs.
    pub const fn writes(self) -> bool {
        matches!(self, Self::Write | Self::Both)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Both => "BOTH",
        })
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            "BOTH" => Ok(Self::Both),
            other => Err(format!("unknown mode '{other}' (expected READ, WRITE or BOTH)")),
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use ppscan_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.l1.ways, 8);
/// assert_eq!(config.llc.cores, 4);
/// assert_eq!(config.min_recurrence, 1);
/// ```
///
/// Overriding the L1 level from JSON (omitted levels keep their defaults):
///
/// ```
/// use ppscan_core::config::Config;
///
/// let json = r#"{
///     "l1": {
///         "size_bytes": 16384,
///         "line_bytes": 64,
///         "ways": 4,
///         "intra_group_threshold": 8,
///         "inter_group_threshold": 500
///     },
///     "min_recurrence": 2
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.l1.ways, 4);
/// assert_eq!(config.l1.cores, 1);
/// assert_eq!(config.llc.ways, 16);
/// assert_eq!(config.min_recurrence, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Private L1 parameters (used by `L1I` and `L1D`).
    #[serde(default = "CacheLevelConfig::l1")]
    pub l1: CacheLevelConfig,

    /// Shared last-level cache parameters (used by `LLC`).
    #[serde(default = "CacheLevelConfig::llc")]
    pub llc: CacheLevelConfig,

    /// A set is detected only with strictly more clusters than this.
    #[serde(default = "Config::default_min_recurrence")]
    pub min_recurrence: usize,
}

impl Config {
    /// Returns the default minimum recurrence count.
    const fn default_min_recurrence() -> usize {
        defaults::MIN_RECURRENCE
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigParse`] if the document does not describe a `Config`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::ConfigParse`] if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Cache level parameters used for `scope`.
    pub const fn level(&self, scope: Scope) -> &CacheLevelConfig {
        match scope {
            Scope::L1I | Scope::L1D => &self.l1,
            Scope::LLC => &self.llc,
        }
    }

    /// Builds the immutable geometry for `scope`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the level parameters are not valid powers of two.
    pub fn geometry(&self, scope: Scope) -> Result<CacheGeometry> {
        CacheGeometry::new(self.level(scope))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            l1: CacheLevelConfig::l1(),
            llc: CacheLevelConfig::llc(),
            min_recurrence: defaults::MIN_RECURRENCE,
        }
    }
}

/// Parameters of one cache level.
///
/// An absent `inter_group_threshold` disables recurring-pair selection: every
/// qualifying cluster is reported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheLevelConfig {
    /// Total cache size in bytes
    pub size_bytes: usize,

    /// Cache line size in bytes
    pub line_bytes: usize,

    /// Associativity (number of ways)
    pub ways: usize,

    /// Physical cores sharing the level (1 for private caches)
    #[serde(default = "CacheLevelConfig::default_cores")]
    pub cores: usize,

    /// Max sequence-index gap between consecutive members of a cluster
    pub intra_group_threshold: u64,

    /// Max centroid distance between two clusters of a recurring pair
    #[serde(default)]
    pub inter_group_threshold: Option<u64>,
}

impl CacheLevelConfig {
    /// Returns the default sharing core count.
    const fn default_cores() -> usize {
        defaults::PRIVATE_CORES
    }

    /// Default private L1 parameters.
    pub const fn l1() -> Self {
        Self {
            size_bytes: defaults::L1_SIZE,
            line_bytes: defaults::L1_LINE,
            ways: defaults::L1_WAYS,
            cores: defaults::PRIVATE_CORES,
            intra_group_threshold: defaults::L1_INTRA_GROUP_THRESHOLD,
            inter_group_threshold: Some(defaults::L1_INTER_GROUP_THRESHOLD),
        }
    }

    /// Default shared last-level cache parameters.
    pub const fn llc() -> Self {
        Self {
            size_bytes: defaults::LLC_SIZE,
            line_bytes: defaults::LLC_LINE,
            ways: defaults::LLC_WAYS,
            cores: defaults::LLC_CORES,
            intra_group_threshold: defaults::LLC_INTRA_GROUP_THRESHOLD,
            inter_group_threshold: Some(defaults::LLC_INTER_GROUP_THRESHOLD),
        }
    }
}
