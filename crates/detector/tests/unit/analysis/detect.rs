//! # Pattern Detection Tests

use ppscan_core::analysis::{Centroid, Cluster, DetectedSet, PatternDetector, Verdict};
use rstest::rstest;

fn clusters(n: u64) -> Vec<Cluster> {
    (0..n)
        .map(|i| Cluster {
            distinct_tags: 8,
            centroid: Centroid::new(u128::from(i) * 5000, 1),
        })
        .collect()
}

/// A set needs strictly more clusters than the minimum.
#[rstest]
#[case(0, false)]
#[case(1, false)]
#[case(2, true)]
#[case(3, true)]
fn recurrence_threshold(#[case] count: u64, #[case] detected: bool) {
    let detector = PatternDetector::new(1);
    let result = detector.detect(12, clusters(count));
    assert_eq!(result.is_some(), detected);
    if let Some(set) = result {
        assert_eq!(set.set_index, 12);
        assert_eq!(set.clusters.len() as u64, count);
    }
}

#[test]
fn zero_minimum_accepts_a_single_cluster() {
    assert!(PatternDetector::new(0).detect(3, clusters(1)).is_some());
    assert!(PatternDetector::new(0).detect(3, Vec::new()).is_none());
}

#[test]
fn verdict_follows_detected_sets() {
    assert_eq!(Verdict::from_detected(&[]), Verdict::NotDetected);
    let set = DetectedSet {
        set_index: 1,
        clusters: clusters(2),
    };
    assert_eq!(Verdict::from_detected(&[set]), Verdict::Detected);
    assert!(Verdict::Detected.is_detected());
    assert!(!Verdict::NotDetected.is_detected());
}

#[test]
fn verdict_lines() {
    assert_eq!(Verdict::Detected.to_string(), "prime+probe pattern is detected!");
    assert_eq!(
        Verdict::NotDetected.to_string(),
        "No prime+probe pattern is detected!"
    );
}
