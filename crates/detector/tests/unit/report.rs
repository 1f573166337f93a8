//! # Report Tests
//!
//! Exact report text and append-mode file handling.

use std::fs;
use std::path::Path;

use ppscan_core::analysis::{Centroid, Cluster, DetectedSet, Pass, PassAnalysis, Verdict};
use ppscan_core::config::{Mode, Scope};
use ppscan_core::report::{Report, report_path};
use ppscan_core::{CacheGeometry, Error};
use pretty_assertions::assert_eq;

use crate::common::small_geometry;

const PARAMS: &str = "Cache parameters (assoc, intra_group_threshold, line_bits, set_mask, set_bits, inter_group_threshold): (4, 2, 6, 63, 8, 3600)";

fn rule(c: char, n: usize) -> String {
    std::iter::repeat_n(c, n).collect()
}

fn detected_set(set_index: u64, centers: &[(u128, u64)]) -> DetectedSet {
    DetectedSet {
        set_index,
        clusters: centers
            .iter()
            .map(|&(sum, members)| Cluster {
                distinct_tags: 4,
                centroid: Centroid::new(sum, members),
            })
            .collect(),
    }
}

fn report<'a>(
    scope: Scope,
    mode: Mode,
    geometry: &'a CacheGeometry,
    passes: &'a [PassAnalysis],
    verbose: bool,
) -> Report<'a> {
    Report {
        scope,
        mode,
        geometry,
        passes,
        verbose,
    }
}

#[test]
fn empty_instruction_report() {
    let geometry = small_geometry();
    let passes = [PassAnalysis {
        pass: Pass::Instruction,
        detected: Vec::new(),
    }];
    let r = report(Scope::L1I, Mode::Both, &geometry, &passes, false);

    let expected = format!(
        "BOTH, L1I\n\n{PARAMS}\n\nL1I detected set idx | (#lines, cluster_center)\n{}\n\nNo prime+probe pattern is detected!\n\n",
        rule('=', 74)
    );
    assert_eq!(r.render(), expected);
    assert_eq!(r.verdict(), Verdict::NotDetected);
}

#[test]
fn detection_report_lists_sets_and_earliest_clusters() {
    let geometry = small_geometry();
    let passes = [
        PassAnalysis {
            pass: Pass::Read,
            detected: vec![
                detected_set(3, &[(6, 4), (30, 4)]),
                detected_set(17, &[(100, 1), (5000, 1)]),
            ],
        },
        PassAnalysis {
            pass: Pass::Write,
            detected: Vec::new(),
        },
    ];
    let r = report(Scope::L1D, Mode::Both, &geometry, &passes, false);

    let eq = rule('=', 74);
    let dash = rule('-', 48);
    let expected = format!(
        "BOTH, L1D\n\n{PARAMS}\n\n\
         Data cache read mode detected set idx | (#lines, cluster_center)\n{eq}\n\
         3 | (4, 1.500)\n{dash}\n\
         17 | (4, 100)\n{dash}\n\n\
         Sets: [3, 17]\n\n#Sets: 2\n\n\
         prime+probe pattern is detected!\n\n\
         Data cache write mode detected set idx | (#lines, cluster_center)\n{eq}\n\n\
         No prime+probe pattern is detected!\n\n"
    );
    assert_eq!(r.render(), expected);
    assert_eq!(r.verdict(), Verdict::Detected);
}

#[test]
fn verbose_lists_every_cluster() {
    let geometry = small_geometry();
    let passes = [PassAnalysis {
        pass: Pass::Write,
        detected: vec![detected_set(3, &[(6, 4), (30, 4)])],
    }];
    let text = report(Scope::LLC, Mode::Write, &geometry, &passes, true).render();

    assert!(text.starts_with("WRITE, LLC\n\n"));
    assert!(text.contains("\n3 | (4, 1.500)\n"));
    assert!(text.contains("\n3 | (4, 7.500)\n"));
    assert!(text.contains("#Sets: 1\n"));
}

#[test]
fn absent_inter_threshold_renders_none() {
    let mut geometry = small_geometry();
    geometry.inter_group_threshold = None;
    let text = report(Scope::L1I, Mode::Both, &geometry, &[], false).render();
    assert!(text.contains(": (4, 2, 6, 63, 8, None)\n"));
}

#[test]
fn report_path_appends_suffix() {
    assert_eq!(
        report_path(Path::new("/tmp/trace.bin")),
        Path::new("/tmp/trace.bin_result.txt")
    );
}

#[test]
fn append_keeps_previous_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.bin_result.txt");
    let geometry = small_geometry();
    let passes = [PassAnalysis {
        pass: Pass::Instruction,
        detected: Vec::new(),
    }];
    let r = report(Scope::L1I, Mode::Both, &geometry, &passes, false);

    r.append_to(&path).unwrap();
    r.append_to(&path).unwrap();

    let once = r.render();
    assert_eq!(fs::read_to_string(&path).unwrap(), format!("{once}{once}"));
}

#[test]
fn unwritable_report_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("r.txt");
    let geometry = small_geometry();
    let err = report(Scope::L1I, Mode::Both, &geometry, &[], false)
        .append_to(&path)
        .unwrap_err();
    assert!(matches!(err, Error::Io { path: p, .. } if p == path));
}
