//! Run summary construction and artifact rendering.
//!
//! `build` folds sorted results into a `RunSummary`; `render` writes one
//! `summary.json` plus one raw-output log per unit into the output
//! directory. Artifact names derive from the workspace-relative source path
//! so a re-run overwrites instead of accumulating stale files.

use crate::models::{AnalysisResult, PackageCounts, RunSummary, Severity};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Fold per-unit results into the run summary.
pub fn build(results: &[AnalysisResult], elapsed: Duration, fix_conflicts: usize) -> RunSummary {
    let mut summary = RunSummary {
        total_units: results.len(),
        succeeded: 0,
        failed: 0,
        errors: 0,
        warnings: 0,
        notes: 0,
        per_package: Default::default(),
        fix_conflicts,
        elapsed_ms: elapsed.as_millis() as u64,
    };
    for result in results {
        if result.succeeded() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        let errors = result.count(Severity::Error);
        let warnings = result.count(Severity::Warning);
        summary.errors += errors;
        summary.warnings += warnings;
        summary.notes += result.count(Severity::Note);
        if let Some(package) = &result.unit.package {
            let counts: &mut PackageCounts =
                summary.per_package.entry(package.clone()).or_default();
            counts.units += 1;
            counts.errors += errors;
            counts.warnings += warnings;
        }
    }
    summary
}

/// Deterministic artifact name for a unit's raw checker output.
///
/// Uses the workspace-relative source path when the unit lives under the
/// workspace, so names stay stable across machines.
pub fn artifact_name(source: &Path, workspace_root: &Path) -> String {
    let rel = pathdiff::diff_paths(source, workspace_root)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| source.to_path_buf());
    let mut name: String = rel
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    name.push_str(".log");
    name
}

/// Write the summary artifact and one per-unit detail artifact.
pub fn render(
    summary: &RunSummary,
    results: &[AnalysisResult],
    output_dir: &Path,
    workspace_root: &Path,
) -> std::io::Result<()> {
    fs::create_dir_all(output_dir)?;
    let summary_json = serde_json::to_string_pretty(summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(output_dir.join("summary.json"), summary_json)?;

    for result in results {
        let path = output_dir.join(artifact_name(&result.unit.source, workspace_root));
        let mut file = fs::File::create(path)?;
        writeln!(file, "unit: {}", result.unit.source.display())?;
        writeln!(file, "directory: {}", result.unit.directory.display())?;
        if let Some(package) = &result.unit.package {
            writeln!(file, "package: {package}")?;
        }
        writeln!(
            file,
            "exit: {} ({} ms)",
            result.exit_code, result.duration_ms
        )?;
        if !result.stdout.is_empty() {
            writeln!(file, "--- stdout ---\n{}", result.stdout)?;
        }
        if !result.stderr.is_empty() {
            writeln!(file, "--- stderr ---\n{}", result.stderr)?;
        }
    }
    Ok(())
}
