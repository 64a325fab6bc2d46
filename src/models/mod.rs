//! Shared data models for units, packages, diagnostics, and run summaries.

pub mod compile_db;
pub mod fix;

use crate::models::fix::FixRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
/// One translation unit from the compilation database.
///
/// Identity is the `(source, directory)` pair; the same source file may be
/// compiled in more than one context and each context is a distinct unit.
pub struct CompileUnit {
    pub source: PathBuf,
    pub directory: PathBuf,
    pub arguments: Vec<String>,
    /// Owning package name, set during assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl CompileUnit {
    /// Stable sort key for deterministic reporting.
    pub fn sort_key(&self) -> (&PathBuf, &PathBuf) {
        (&self.source, &self.directory)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// A package discovered from a workspace manifest marker.
pub struct Package {
    pub name: String,
    pub root: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Severity of a checker diagnostic.
pub enum Severity {
    Warning,
    Error,
    Note,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// A single parsed checker diagnostic.
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    /// Check name in brackets at the end of the line, when present.
    pub check: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
/// Outcome of one checker invocation. Immutable after creation.
pub struct AnalysisResult {
    pub unit: CompileUnit,
    pub exit_code: i32,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixes: Option<FixRecord>,
    #[serde(skip)]
    pub stdout: String,
    #[serde(skip)]
    pub stderr: String,
    pub duration_ms: u64,
    /// True when the checker process was killed by cancellation. Interrupted
    /// results are discarded before aggregation.
    #[serde(skip)]
    pub interrupted: bool,
}

impl AnalysisResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    pub fn count(&self, sev: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == sev).count()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
/// Per-package slice of the run summary.
pub struct PackageCounts {
    pub units: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Aggregated run outcome, built once after the scheduler drains.
pub struct RunSummary {
    pub total_units: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub notes: usize,
    pub per_package: BTreeMap<String, PackageCounts>,
    pub fix_conflicts: usize,
    pub elapsed_ms: u64,
}
