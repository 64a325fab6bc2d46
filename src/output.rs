//! Human/JSON printers for progress, per-unit findings, and the summary.
//!
//! Human mode colors severities via owo-colors unless `NO_COLOR` is set;
//! JSON mode prints one stable document composed by `compose_run_json`.

use crate::models::{AnalysisResult, RunSummary, Severity};
use crate::scheduler::ProgressEvent;
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && utils::use_colors()
}

/// Stream one progress line as a unit completes. Completion order, not the
/// final sorted order.
pub fn print_progress(event: &ProgressEvent, workspace_root: &Path) {
    let rel = pathdiff::diff_paths(&event.source, workspace_root)
        .unwrap_or_else(|| event.source.clone());
    let status = if event.ok {
        if utils::use_colors() {
            "✔".green().to_string()
        } else {
            "ok".to_string()
        }
    } else if utils::use_colors() {
        "✖".red().to_string()
    } else {
        "fail".to_string()
    };
    let package = event.package.as_deref().unwrap_or("-");
    eprintln!(
        "[{}/{}] {} {} ({}) {} ms",
        event.completed,
        event.total,
        status,
        rel.display(),
        package,
        event.duration_ms
    );
}

/// Print per-unit detail for units with findings or failures, in the sorted
/// result order. JSON mode defers to the single composed document.
pub fn print_results(results: &[AnalysisResult], output: &str) {
    if output == "json" {
        return;
    }
    let color = use_colors(output);
    for result in results {
        if result.succeeded() && result.diagnostics.is_empty() {
            continue;
        }
        let header = format!(
            "── {} (exit {})",
            result.unit.source.display(),
            result.exit_code
        );
        if color {
            println!("{}", header.bold());
        } else {
            println!("{header}");
        }
        for diag in &result.diagnostics {
            let sev = match diag.severity {
                Severity::Error => {
                    if color {
                        "⟦error⟧".red().bold().to_string()
                    } else {
                        "⟦error⟧".to_string()
                    }
                }
                Severity::Warning => {
                    if color {
                        "⟦warn⟧".yellow().bold().to_string()
                    } else {
                        "⟦warn⟧".to_string()
                    }
                }
                Severity::Note => {
                    if color {
                        "⟦note⟧".blue().to_string()
                    } else {
                        "⟦note⟧".to_string()
                    }
                }
            };
            let check = if diag.check.is_empty() {
                String::new()
            } else {
                format!(" ❲{}❳", diag.check)
            };
            println!(
                "{} {}:{}:{} — {}{}",
                sev, diag.file, diag.line, diag.column, diag.message, check
            );
        }
        if !result.succeeded() && !result.stderr.is_empty() {
            println!("{}", result.stderr.trim_end());
        }
    }
}

/// Print the final summary in the requested format.
pub fn print_summary(summary: &RunSummary, results: &[AnalysisResult], output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_run_json(summary, results)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for (package, counts) in &summary.per_package {
                println!(
                    "{}: {} unit(s), {} error(s), {} warning(s)",
                    package, counts.units, counts.errors, counts.warnings
                );
            }
            let line = format!(
                "— Summary — units={} ok={} failed={} errors={} warnings={} notes={} fix_conflicts={} elapsed={}ms",
                summary.total_units,
                summary.succeeded,
                summary.failed,
                summary.errors,
                summary.warnings,
                summary.notes,
                summary.fix_conflicts,
                summary.elapsed_ms
            );
            if color {
                println!("{}", line.bold());
            } else {
                println!("{line}");
            }
        }
    }
}

/// Compose the JSON run document (pure) for testing/snapshot purposes.
pub fn compose_run_json(summary: &RunSummary, results: &[AnalysisResult]) -> JsonVal {
    json!({
        "units": results,
        "summary": summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompileUnit, Diagnostic};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn test_compose_run_json_shape() {
        let results = vec![AnalysisResult {
            unit: CompileUnit {
                source: PathBuf::from("/ws/src/pkg_a/a.cpp"),
                directory: PathBuf::from("/ws/build/pkg_a"),
                arguments: vec![],
                package: Some("pkg_a".into()),
            },
            exit_code: 1,
            diagnostics: vec![Diagnostic {
                file: "/ws/src/pkg_a/a.cpp".into(),
                line: 3,
                column: 7,
                severity: Severity::Error,
                check: "bugprone-use-after-move".into(),
                message: "use after move".into(),
            }],
            fixes: None,
            stdout: "raw".into(),
            stderr: String::new(),
            duration_ms: 9,
            interrupted: false,
        }];
        let summary = RunSummary {
            total_units: 1,
            succeeded: 0,
            failed: 1,
            errors: 1,
            warnings: 0,
            notes: 0,
            per_package: BTreeMap::new(),
            fix_conflicts: 0,
            elapsed_ms: 9,
        };
        let out = compose_run_json(&summary, &results);
        assert_eq!(out["summary"]["failed"], 1);
        assert_eq!(out["units"][0]["exit_code"], 1);
        assert_eq!(out["units"][0]["diagnostics"][0]["severity"], "error");
        // Raw process output stays out of the JSON document.
        assert!(out["units"][0].get("stdout").is_none());
    }
}
