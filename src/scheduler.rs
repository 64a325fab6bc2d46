//! Bounded-concurrency execution of checker invocations.
//!
//! A rayon pool sized to `jobs` guarantees at most that many checker
//! processes in flight. Workers check the cancel token before dispatch and
//! the checker kills its child when the token flips mid-invocation, so an
//! interrupt stops the run without losing already-completed results.

use crate::checker::Checker;
use crate::error::WorkspaceError;
use crate::models::{AnalysisResult, CompileUnit};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
/// Cloneable cancellation flag shared between the interrupt handler, the
/// workers, and in-flight checker invocations.
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
/// Streamed to the verbose sink as each unit completes, in completion order.
pub struct ProgressEvent {
    pub source: PathBuf,
    pub package: Option<String>,
    pub ok: bool,
    pub duration_ms: u64,
    pub completed: usize,
    pub total: usize,
}

/// Run the checker once per unit with at most `jobs` invocations in flight.
///
/// The returned results are sorted by `(source, directory)` so reporting is
/// deterministic regardless of completion order. Units skipped or killed by
/// cancellation produce no result. Per-unit failures are recorded on their
/// results and never abort siblings.
pub fn run(
    units: &[CompileUnit],
    jobs: usize,
    checker: &dyn Checker,
    fixes_dir: Option<&Path>,
    cancel: &CancelToken,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<Vec<AnalysisResult>, WorkspaceError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| WorkspaceError::Pool(e.to_string()))?;

    let total = units.len();
    let completed = AtomicUsize::new(0);
    let collected: Vec<Option<AnalysisResult>> = pool.install(|| {
        units
            .par_iter()
            .enumerate()
            .map(|(idx, unit)| {
                if cancel.is_cancelled() {
                    return None;
                }
                let fixes_path = fixes_dir.map(|dir| dir.join(format!("fixes-{idx}.yaml")));
                let result = checker.invoke(unit, fixes_path.as_deref(), cancel);
                if result.interrupted {
                    return None;
                }
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(tx) = &progress {
                    let _ = tx.send(ProgressEvent {
                        source: result.unit.source.clone(),
                        package: result.unit.package.clone(),
                        ok: result.succeeded(),
                        duration_ms: result.duration_ms,
                        completed: done,
                        total,
                    });
                }
                Some(result)
            })
            .collect()
    });

    let mut results: Vec<AnalysisResult> = collected.into_iter().flatten().collect();
    results.sort_by(|a, b| a.unit.sort_key().cmp(&b.unit.sort_key()));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnostic, Severity};
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Canned checker: emits one warning per unit whose source contains
    /// "warn" and fails units whose source contains "bad".
    struct FakeChecker {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        cancel_after: Option<usize>,
        invocations: AtomicUsize,
        seen_fix_paths: Mutex<Vec<Option<PathBuf>>>,
    }

    impl FakeChecker {
        fn new() -> Self {
            Self {
                delay: Duration::from_millis(10),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                cancel_after: None,
                invocations: AtomicUsize::new(0),
                seen_fix_paths: Mutex::new(Vec::new()),
            }
        }
    }

    impl Checker for FakeChecker {
        fn invoke(
            &self,
            unit: &CompileUnit,
            fixes_path: Option<&Path>,
            cancel: &CancelToken,
        ) -> AnalysisResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.seen_fix_paths
                .lock()
                .unwrap()
                .push(fixes_path.map(Path::to_path_buf));

            let count = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
            if self.cancel_after.is_some_and(|n| count >= n) {
                cancel.cancel();
            }

            let source = unit.source.to_string_lossy();
            let diagnostics = if source.contains("warn") {
                vec![Diagnostic {
                    file: source.to_string(),
                    line: 1,
                    column: 1,
                    severity: Severity::Warning,
                    check: "fake-check".into(),
                    message: "canned warning".into(),
                }]
            } else {
                Vec::new()
            };
            AnalysisResult {
                unit: unit.clone(),
                exit_code: if source.contains("bad") { 1 } else { 0 },
                diagnostics,
                fixes: None,
                stdout: String::new(),
                stderr: String::new(),
                duration_ms: 1,
                interrupted: false,
            }
        }
    }

    fn units(n: usize) -> Vec<CompileUnit> {
        (0..n)
            .map(|i| CompileUnit {
                source: PathBuf::from(format!("/ws/src/pkg_a/file_{i}.cpp")),
                directory: PathBuf::from("/ws/build/pkg_a"),
                arguments: vec![],
                package: Some("pkg_a".into()),
            })
            .collect()
    }

    #[test]
    fn test_same_result_set_for_serial_and_parallel() {
        let us = units(8);
        let serial = run(&us, 1, &FakeChecker::new(), None, &CancelToken::default(), None).unwrap();
        let parallel =
            run(&us, 4, &FakeChecker::new(), None, &CancelToken::default(), None).unwrap();
        assert_eq!(serial.len(), parallel.len());
        let keys = |rs: &[AnalysisResult]| -> Vec<PathBuf> {
            rs.iter().map(|r| r.unit.source.clone()).collect()
        };
        assert_eq!(keys(&serial), keys(&parallel));
    }

    #[test]
    fn test_results_sorted_by_source_path() {
        let mut us = units(5);
        us.reverse();
        let results =
            run(&us, 3, &FakeChecker::new(), None, &CancelToken::default(), None).unwrap();
        let sources: Vec<_> = results.iter().map(|r| &r.unit.source).collect();
        let mut sorted = sources.clone();
        sorted.sort();
        assert_eq!(sources, sorted);
    }

    #[test]
    fn test_in_flight_never_exceeds_jobs() {
        let checker = FakeChecker::new();
        run(&units(12), 3, &checker, None, &CancelToken::default(), None).unwrap();
        assert!(checker.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_cancellation_stops_dispatch() {
        let mut checker = FakeChecker::new();
        checker.cancel_after = Some(1);
        let results = run(&units(6), 1, &checker, None, &CancelToken::default(), None).unwrap();
        // Only the unit that completed before the token flipped is reported.
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_failed_unit_does_not_abort_siblings() {
        let mut us = units(3);
        us[1].source = PathBuf::from("/ws/src/pkg_a/bad_file.cpp");
        let results =
            run(&us, 2, &FakeChecker::new(), None, &CancelToken::default(), None).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| !r.succeeded()).count(), 1);
    }

    #[test]
    fn test_progress_events_cover_all_units() {
        let (tx, rx) = mpsc::channel();
        let results = run(
            &units(4),
            2,
            &FakeChecker::new(),
            None,
            &CancelToken::default(),
            Some(tx),
        )
        .unwrap();
        let events: Vec<ProgressEvent> = rx.iter().collect();
        assert_eq!(events.len(), results.len());
        assert!(events.iter().all(|e| e.total == 4 && e.ok));
        assert!(events.iter().any(|e| e.completed == 4));
    }

    #[test]
    fn test_fix_paths_are_per_unit_and_only_when_requested() {
        let checker = FakeChecker::new();
        let dir = tempfile::tempdir().unwrap();
        run(
            &units(3),
            1,
            &checker,
            Some(dir.path()),
            &CancelToken::default(),
            None,
        )
        .unwrap();
        let paths = checker.seen_fix_paths.lock().unwrap();
        let mut distinct: Vec<_> = paths.iter().flatten().collect();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 3);

        let checker = FakeChecker::new();
        run(&units(2), 1, &checker, None, &CancelToken::default(), None).unwrap();
        assert!(checker
            .seen_fix_paths
            .lock()
            .unwrap()
            .iter()
            .all(Option::is_none));
    }
}
