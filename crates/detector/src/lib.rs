//! Prime+Probe pattern detection library.
//!
//! This crate detects the timing signature of Prime+Probe cache attacks in offline access traces:
//! 1. **Geometry:** Set-index and tag layout derived from cache-level parameters.
//! 2. **Trace:** Fixed-width binary record ingestion into ordered access events.
//! 3. **Analysis:** Per-set grouping, unique-line filtering, temporal clustering, and detection.
//! 4. **Pipeline:** A rayon worker pool that shuffles accesses by set and reduces each set independently.
//! 5. **Report:** Append-mode text reports with the run-level verdict.

/// Common types (addresses, access kinds, errors).
pub mod common;
/// Analysis configuration (defaults, scope and mode enums, per-level cache parameters).
pub mod config;
/// Cache geometry and address decoding.
pub mod geometry;
/// Trace ingestion (record layouts, access events).
pub mod trace;
/// Grouping, clustering, detection, and the parallel pipeline.
pub mod analysis;
/// Text report rendering.
pub mod report;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Crate-wide error type and result alias.
pub use crate::common::error::{Error, Result};
/// Immutable per-run cache geometry.
pub use crate::geometry::CacheGeometry;
/// Pipeline entry point; run one scope over a loaded trace.
pub use crate::analysis::pipeline::Pipeline;
