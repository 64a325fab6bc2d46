//! wstidy CLI binary entry point.
//! Wires CLI flags to the pipeline: load compile units, resolve packages,
//! schedule checker runs, aggregate fixes, and print the report.

use clap::Parser;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use wstidy::checker::{CheckerConfig, ClangTidy};
use wstidy::cli::Cli;
use wstidy::scheduler::CancelToken;
use wstidy::{compdb, config, fixes, output, packages, report, scheduler, utils};

fn main() {
    let cli = Cli::parse();
    let eff = config::resolve_effective(&cli);
    if config::load_config(&eff.workspace_root).is_none() {
        eprintln!(
            "{} {}",
            utils::note_prefix(),
            "No wstidy.toml found; using defaults."
        );
    }

    let checker_config = CheckerConfig {
        config: eff.config.clone(),
        config_file: eff.config_file.clone(),
    };

    // Read-only mode: ask the checker which checks are enabled and stop.
    if eff.explain_config {
        let tidy = ClangTidy::new(&eff.checker_cmd, checker_config, HashMap::new());
        match tidy.explain_config() {
            Ok(text) => {
                print!("{text}");
                return;
            }
            Err(e) => {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!("could not query checker configuration: {e}")
                );
                std::process::exit(2);
            }
        }
    }

    let units = match compdb::load_workspace(&eff.workspace_root) {
        Ok(units) => units,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    };

    let discovered = packages::discover(&eff.workspace_root);
    if discovered.is_empty() {
        eprintln!(
            "{} {}",
            utils::warn_prefix(),
            "no packages discovered in the workspace; all units are unowned"
        );
    }
    for name in packages::unknown_selections(&eff.selection, &discovered) {
        eprintln!(
            "{} {}",
            utils::warn_prefix(),
            format!("--packages-select names unknown package '{name}'")
        );
    }
    let units = packages::assign(units, &discovered);
    let units = packages::filter(&units, &eff.selection);
    if units.is_empty() {
        eprintln!(
            "{} {}",
            utils::info_prefix(),
            "no compile units matched the selection"
        );
        return;
    }
    eprintln!(
        "{} {}",
        utils::info_prefix(),
        format!(
            "processing {} unit(s) with {} job(s)",
            units.len(),
            eff.jobs
        )
    );

    let package_roots: HashMap<_, _> = discovered
        .iter()
        .map(|p| (p.name.clone(), p.root.clone()))
        .collect();
    let tidy = ClangTidy::new(&eff.checker_cmd, checker_config, package_roots);

    let cancel = CancelToken::default();
    {
        let token = cancel.clone();
        let _ = ctrlc::set_handler(move || token.cancel());
    }

    let want_fixes = eff.export_fixes.is_some() || eff.fix_errors;
    let fixes_dir = if want_fixes {
        match tempfile::tempdir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!("could not create fix scratch directory: {e}")
                );
                std::process::exit(2);
            }
        }
    } else {
        None
    };

    let (progress_tx, progress_thread) = if eff.verbose {
        let (tx, rx) = mpsc::channel::<scheduler::ProgressEvent>();
        let root = eff.workspace_root.clone();
        let handle = thread::spawn(move || {
            for event in rx {
                output::print_progress(&event, &root);
            }
        });
        (Some(tx), Some(handle))
    } else {
        (None, None)
    };

    let started = Instant::now();
    let results = match scheduler::run(
        &units,
        eff.jobs,
        &tidy,
        fixes_dir.as_ref().map(|d| d.path()),
        &cancel,
        progress_tx,
    ) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            std::process::exit(2);
        }
    };
    if let Some(handle) = progress_thread {
        let _ = handle.join();
    }

    let mut artifact_failure = false;
    let mut fix_conflicts = 0;
    if want_fixes {
        let set = fixes::aggregate(&results);
        fix_conflicts = set.conflicts.len();
        for conflict in &set.conflicts {
            eprintln!(
                "{} {}",
                utils::warn_prefix(),
                format!(
                    "overlapping fix dropped for {} at {}..{}",
                    conflict.file,
                    conflict.offset,
                    conflict.offset + conflict.length
                )
            );
        }
        if let Some(path) = &eff.export_fixes {
            if let Err(e) = fixes::export(&set, path) {
                eprintln!(
                    "{} {}",
                    utils::error_prefix(),
                    format!("could not export fixes to {}: {e}", path.display())
                );
                artifact_failure = true;
            }
        }
        if eff.fix_errors {
            let apply_report = fixes::apply(&set);
            for (file, count) in &apply_report.applied {
                eprintln!(
                    "{} {}",
                    utils::info_prefix(),
                    format!("applied {count} fix(es) to {file}")
                );
            }
            for (file, reason) in &apply_report.failures {
                eprintln!(
                    "{} {}",
                    utils::warn_prefix(),
                    format!("could not apply fixes to {file}: {reason}")
                );
            }
        }
    }

    let summary = report::build(&results, started.elapsed(), fix_conflicts);
    if let Some(dir) = &eff.output_dir {
        if let Err(e) = report::render(&summary, &results, dir, &eff.workspace_root) {
            eprintln!(
                "{} {}",
                utils::error_prefix(),
                format!("could not write artifacts to {}: {e}", dir.display())
            );
            artifact_failure = true;
        }
    }
    output::print_results(&results, &eff.output);
    output::print_summary(&summary, &results, &eff.output);

    if cancel.is_cancelled() {
        std::process::exit(130);
    }
    if summary.failed > 0 || summary.errors > 0 || artifact_failure {
        std::process::exit(1);
    }
}
