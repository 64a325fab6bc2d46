//! Fix-record aggregation, export, and in-place application.
//!
//! Aggregation walks results in their sorted unit order. Identical
//! replacements (same file, range, and text) collapse silently; a
//! replacement overlapping an already-kept range in the same file is dropped
//! (first-seen wins) and recorded as a conflict, never silently discarded.

use crate::models::fix::{FixRecord, Replacement};
use crate::models::AnalysisResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// An overlapping edit that lost to an earlier one.
pub struct FixConflict {
    pub file: String,
    pub offset: usize,
    pub length: usize,
    pub dropped_text: String,
}

#[derive(Debug, Default, Serialize)]
/// The merged fix set. Write-once after all units complete.
pub struct FixSet {
    pub replacements: Vec<Replacement>,
    pub conflicts: Vec<FixConflict>,
}

#[derive(Debug, Default)]
/// Per-file outcome of `apply`.
pub struct ApplyReport {
    /// (file, replacements applied)
    pub applied: Vec<(String, usize)>,
    /// (file, reason)
    pub failures: Vec<(String, String)>,
}

/// Merge per-unit fix records into one fix set.
pub fn aggregate(results: &[AnalysisResult]) -> FixSet {
    let mut set = FixSet::default();
    for result in results {
        let Some(record) = &result.fixes else { continue };
        for rep in &record.replacements {
            if set.replacements.contains(rep) {
                continue; // exact duplicate, common for shared headers
            }
            if set.replacements.iter().any(|kept| kept.overlaps(rep)) {
                set.conflicts.push(FixConflict {
                    file: rep.file_path.clone(),
                    offset: rep.offset,
                    length: rep.length,
                    dropped_text: rep.text.clone(),
                });
                continue;
            }
            set.replacements.push(rep.clone());
        }
    }
    set
}

/// Write the merged set in the layout `clang-apply-replacements` consumes.
pub fn export(set: &FixSet, path: &Path) -> std::io::Result<()> {
    let record = FixRecord {
        main_source_file: String::new(),
        replacements: set.replacements.clone(),
    };
    let yaml = serde_yaml::to_string(&record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, yaml)
}

/// Rewrite source files in place. Destructive; only runs under --fix-errors.
///
/// Edits are applied per file in descending offset order so earlier offsets
/// stay valid. A failure on one file is recorded and does not block others.
pub fn apply(set: &FixSet) -> ApplyReport {
    let mut by_file: BTreeMap<&str, Vec<&Replacement>> = BTreeMap::new();
    for rep in &set.replacements {
        by_file.entry(rep.file_path.as_str()).or_default().push(rep);
    }

    let mut report = ApplyReport::default();
    for (file, mut reps) in by_file {
        reps.sort_by(|a, b| b.offset.cmp(&a.offset));
        match apply_to_file(Path::new(file), &reps) {
            Ok(count) => report.applied.push((file.to_string(), count)),
            Err(reason) => report.failures.push((file.to_string(), reason)),
        }
    }
    report
}

fn apply_to_file(path: &Path, reps: &[&Replacement]) -> Result<usize, String> {
    let mut bytes = fs::read(path).map_err(|e| e.to_string())?;
    for rep in reps {
        let end = rep.offset + rep.length;
        if end > bytes.len() {
            return Err(format!(
                "replacement at {}..{} is out of range for a {}-byte file",
                rep.offset,
                end,
                bytes.len()
            ));
        }
        bytes.splice(rep.offset..end, rep.text.bytes());
    }
    fs::write(path, &bytes).map_err(|e| e.to_string())?;
    Ok(reps.len())
}
