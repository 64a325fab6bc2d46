//! End-to-end pipeline test over a synthetic built workspace:
//! compile-database loading, package discovery and assignment, selection
//! filtering, scheduling against a canned checker, and summary building.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wstidy::checker::Checker;
use wstidy::models::{AnalysisResult, CompileUnit, Diagnostic, Severity};
use wstidy::packages::SelectionFilter;
use wstidy::scheduler::CancelToken;
use wstidy::{compdb, packages, report, scheduler};

/// Flags any source whose name contains "violation" with one error.
struct CannedChecker;

impl Checker for CannedChecker {
    fn invoke(
        &self,
        unit: &CompileUnit,
        _fixes_path: Option<&Path>,
        _cancel: &CancelToken,
    ) -> AnalysisResult {
        let source = unit.source.to_string_lossy().to_string();
        let diagnostics = if source.contains("violation") {
            vec![Diagnostic {
                file: source.clone(),
                line: 4,
                column: 2,
                severity: Severity::Error,
                check: "readability-braces-around-statements".into(),
                message: "statement should be inside braces".into(),
            }]
        } else {
            Vec::new()
        };
        AnalysisResult {
            unit: unit.clone(),
            exit_code: if diagnostics.is_empty() { 0 } else { 1 },
            diagnostics,
            fixes: None,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 1,
            interrupted: false,
        }
    }
}

/// Build a workspace with pkg_a (one clean file, one violation) and pkg_b
/// (one clean file), each with its own build-directory compile database.
fn build_workspace(root: &Path) {
    for (pkg, files) in [
        ("pkg_a", vec!["clean.cpp", "violation.cpp"]),
        ("pkg_b", vec!["clean.cpp"]),
    ] {
        let pkg_root = root.join("src").join(pkg);
        fs::create_dir_all(&pkg_root).unwrap();
        fs::write(pkg_root.join("package.xml"), "<package/>").unwrap();
        let build_dir = root.join("build").join(pkg);
        fs::create_dir_all(&build_dir).unwrap();
        let entries: Vec<String> = files
            .iter()
            .map(|f| {
                let src = pkg_root.join(f);
                fs::write(&src, "int main() { return 0; }\n").unwrap();
                format!(
                    r#"{{"file": "{}", "directory": "{}", "command": "c++ -c {}"}}"#,
                    src.display(),
                    build_dir.display(),
                    f
                )
            })
            .collect();
        fs::write(
            build_dir.join("compile_commands.json"),
            format!("[{}]", entries.join(",")),
        )
        .unwrap();
    }
}

fn load_and_assign(root: &Path) -> (Vec<CompileUnit>, Vec<wstidy::models::Package>) {
    let units = compdb::load_workspace(root).unwrap();
    let pkgs = packages::discover(root);
    (packages::assign(units, &pkgs), pkgs)
}

fn run_selection(root: &Path, selection: &SelectionFilter) -> Vec<AnalysisResult> {
    let (units, _) = load_and_assign(root);
    let selected = packages::filter(&units, selection);
    scheduler::run(&selected, 2, &CannedChecker, None, &CancelToken::default(), None).unwrap()
}

#[test]
fn test_packages_select_pkg_a() {
    let ws = tempfile::tempdir().unwrap();
    build_workspace(ws.path());
    let selection = SelectionFilter {
        packages: ["pkg_a".to_string()].into_iter().collect(),
        base_path: None,
    };
    let results = run_selection(ws.path(), &selection);
    assert_eq!(results.len(), 2);
    let summary = report::build(&results, Duration::from_millis(1), 0);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.per_package.len(), 1);
}

#[test]
fn test_no_filter_covers_all_units() {
    let ws = tempfile::tempdir().unwrap();
    build_workspace(ws.path());
    let results = run_selection(ws.path(), &SelectionFilter::default());
    assert_eq!(results.len(), 3);
    let summary = report::build(&results, Duration::from_millis(1), 0);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.per_package["pkg_a"].units, 2);
    assert_eq!(summary.per_package["pkg_b"].units, 1);
}

#[test]
fn test_base_path_restricted_to_clean_package() {
    let ws = tempfile::tempdir().unwrap();
    build_workspace(ws.path());
    let selection = SelectionFilter {
        packages: Default::default(),
        base_path: Some(ws.path().join("src/pkg_b")),
    };
    let results = run_selection(ws.path(), &selection);
    assert_eq!(results.len(), 1);
    let summary = report::build(&results, Duration::from_millis(1), 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.failed, 0);
}

#[test]
fn test_unknown_selection_yields_empty_run() {
    let ws = tempfile::tempdir().unwrap();
    build_workspace(ws.path());
    let (units, pkgs) = load_and_assign(ws.path());
    let selection = SelectionFilter {
        packages: ["no_such_pkg".to_string()].into_iter().collect(),
        base_path: None,
    };
    assert_eq!(
        packages::unknown_selections(&selection, &pkgs),
        vec!["no_such_pkg"]
    );
    assert!(packages::filter(&units, &selection).is_empty());
}

#[test]
fn test_serial_and_parallel_summaries_match() {
    let ws = tempfile::tempdir().unwrap();
    build_workspace(ws.path());
    let (units, _) = load_and_assign(ws.path());
    let serial =
        scheduler::run(&units, 1, &CannedChecker, None, &CancelToken::default(), None).unwrap();
    let parallel =
        scheduler::run(&units, 4, &CannedChecker, None, &CancelToken::default(), None).unwrap();
    let key = |rs: &[AnalysisResult]| -> Vec<(PathBuf, i32)> {
        rs.iter()
            .map(|r| (r.unit.source.clone(), r.exit_code))
            .collect()
    };
    assert_eq!(key(&serial), key(&parallel));
    assert_eq!(
        report::build(&serial, Duration::from_millis(1), 0),
        report::build(&parallel, Duration::from_millis(1), 0)
    );
}
