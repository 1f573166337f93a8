//! Result report rendering.
//!
//! Reports are plain text appended to `<input>_result.txt`. A report is rendered fully in
//! memory and appended with one write; the file is not transactional, so a truncated
//! trailing report means that run failed and should simply be repeated.
//!
//! Layout:
//! 1. **Header:** `<MODE>, <SCOPE>`.
//! 2. **Parameters:** The resolved geometry tuple.
//! 3. **Tables:** One per pass, rows of `set | (#lines, cluster_center)`.
//! 4. **Summary:** Detected set list and count, then the verdict line.

use std::ffi::OsString;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::analysis::{Cluster, DetectedSet, PassAnalysis, Verdict};
use crate::common::error::{Error, Result};
use crate::config::{Mode, Scope};
use crate::geometry::CacheGeometry;

const TABLE_RULE: &str = "==========================================================================";
const ROW_RULE: &str = "------------------------------------------------";

/// Suffix appended to the input path to name the report file.
pub const REPORT_SUFFIX: &str = "_result.txt";

/// Path of the report written for `input`.
pub fn report_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(REPORT_SUFFIX);
    PathBuf::from(name)
}

/// Everything one run reports.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    /// Analyzed scope.
    pub scope: Scope,
    /// Requested data mode (echoed even for `L1I`).
    pub mode: Mode,
    /// Geometry used for decoding.
    pub geometry: &'a CacheGeometry,
    /// Results in pass order.
    pub passes: &'a [PassAnalysis],
    /// List every emitted cluster instead of the earliest one per set.
    pub verbose: bool,
}

impl Report<'_> {
    /// Verdict over all passes.
    pub fn verdict(&self) -> Verdict {
        if self.passes.iter().any(|p| p.verdict().is_detected()) {
            Verdict::Detected
        } else {
            Verdict::NotDetected
        }
    }

    /// Renders the report text.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Appends the rendered report to `path`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be opened or written.
    pub fn append_to(&self, path: &Path) -> Result<()> {
        let text = self.render();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::io(path, e))?;
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| Error::io(path, e))
    }

    fn write_parameters(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.geometry;
        let inter = g
            .inter_group_threshold
            .map_or_else(|| "None".to_owned(), |t| t.to_string());
        write!(
            out,
            "Cache parameters (assoc, intra_group_threshold, line_bits, set_mask, set_bits, inter_group_threshold): ({}, {}, {}, {}, {}, {})\n\n",
            g.associativity,
            g.intra_group_threshold,
            g.line_bits,
            g.set_index_mask,
            g.set_bits,
            inter
        )
    }

    fn write_pass(&self, out: &mut fmt::Formatter<'_>, pass: &PassAnalysis) -> fmt::Result {
        write!(out, "{} detected set idx | (#lines, cluster_center)\n{TABLE_RULE}", pass.pass)?;
        for set in &pass.detected {
            for cluster in self.rows(set) {
                write!(out, "\n{} | {cluster}\n{ROW_RULE}", set.set_index)?;
            }
        }
        out.write_str("\n\n")?;

        if !pass.detected.is_empty() {
            let sets: Vec<String> = pass.detected.iter().map(|s| s.set_index.to_string()).collect();
            write!(out, "Sets: [{}]\n\n", sets.join(", "))?;
            write!(out, "#Sets: {}\n\n", sets.len())?;
        }
        write!(out, "{}\n\n", pass.verdict())
    }

    /// Clusters printed for one detected set.
    fn rows<'s>(&self, set: &'s DetectedSet) -> &'s [Cluster] {
        if self.verbose {
            &set.clusters
        } else {
            &set.clusters[..set.clusters.len().min(1)]
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}\n\n", self.mode, self.scope)?;
        self.write_parameters(f)?;
        for pass in self.passes {
            self.write_pass(f, pass)?;
        }
        Ok(())
    }
}
