//! # Test Infrastructure
//!
//! Helpers for synthesizing traces with a known cache-set layout.

use std::io::Write;

use ppscan_core::CacheGeometry;
use ppscan_core::analysis::Sample;
use ppscan_core::common::{AccessKind, PhysAddr};
use ppscan_core::config::CacheLevelConfig;
use ppscan_core::trace::AccessEvent;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

/// Routes library logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 16 KiB, 4-way, 64-byte-line private cache.
///
/// With these parameters:
///   - number_of_sets = 16384 / (4 * 64) = 64, mask 63
///   - line_bits = 6, set_bits = log2(4 * 64) = 8
///   - tag = addr >> 14
pub fn small_level() -> CacheLevelConfig {
    CacheLevelConfig {
        size_bytes: 16 * 1024,
        line_bytes: 64,
        ways: 4,
        cores: 1,
        intra_group_threshold: 2,
        inter_group_threshold: Some(3600),
    }
}

/// Geometry of [`small_level`].
pub fn small_geometry() -> CacheGeometry {
    CacheGeometry::new(&small_level()).unwrap()
}

/// Encodes program counters as an instruction-scope trace.
pub fn instruction_trace(pcs: &[u64]) -> Vec<u8> {
    pcs.iter().flat_map(|pc| pc.to_ne_bytes()).collect()
}

/// Encodes `(flag, address)` pairs as a data-scope trace.
pub fn data_trace(records: &[(u64, u64)]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|&(flag, addr)| {
            let mut record = [0u8; 16];
            record[..8].copy_from_slice(&flag.to_ne_bytes());
            record[8..].copy_from_slice(&addr.to_ne_bytes());
            record
        })
        .collect()
}

/// Writes `bytes` to a fresh temporary file.
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Builds samples from parallel index and tag lists.
pub fn samples(indices: &[u64], tags: &[u64]) -> Vec<Sample> {
    assert_eq!(indices.len(), tags.len());
    indices
        .iter()
        .zip(tags)
        .map(|(&index, &tag)| Sample::new(index, tag))
        .collect()
}

/// Builds events of one kind at consecutive sequence indices.
pub fn events(kind: AccessKind, addrs: &[u64]) -> Vec<AccessEvent> {
    addrs
        .iter()
        .enumerate()
        .map(|(i, &addr)| AccessEvent {
            sequence_index: i as u64,
            kind,
            physical_address: PhysAddr(addr),
        })
        .collect()
}

/// A probing round: one access per tag in `tags`, all in `set`.
pub fn round(geometry: &CacheGeometry, set: u64, tags: std::ops::Range<u64>) -> Vec<u64> {
    tags.map(|tag| geometry.compose(tag, set, 0).val()).collect()
}
