//! Compilation database loading.
//!
//! Reads `compile_commands.json` from a build directory (or every
//! per-package build directory under `build/`) and produces an immutable
//! snapshot of compile units. A rebuild of the database after loading does
//! not affect an in-flight run.

use crate::error::WorkspaceError;
use crate::models::compile_db::CompileCommand;
use crate::models::CompileUnit;
use crate::utils;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPILE_DB_FILE: &str = "compile_commands.json";

/// Load all units from `build_dir/compile_commands.json`.
///
/// Records missing `file` or `directory` are skipped with a warning; the
/// load fails only when the file is absent (`NotFound`), not a JSON array of
/// records (`Parse`), or zero valid units remain (`EmptyWorkspace`).
pub fn load(build_dir: &Path) -> Result<Vec<CompileUnit>, WorkspaceError> {
    let db_path = build_dir.join(COMPILE_DB_FILE);
    if !db_path.is_file() {
        return Err(WorkspaceError::NotFound(db_path));
    }
    let data = fs::read_to_string(&db_path)?;
    let records: Vec<CompileCommand> =
        serde_json::from_str(&data).map_err(|e| WorkspaceError::Parse {
            path: db_path.clone(),
            reason: e.to_string(),
        })?;
    let mut units = Vec::new();
    for (idx, record) in records.into_iter().enumerate() {
        match record.into_unit() {
            Some(unit) => units.push(unit),
            None => eprintln!(
                "{} skipping record #{} in {}: missing file or directory",
                utils::warn_prefix(),
                idx,
                db_path.display()
            ),
        }
    }
    if units.is_empty() {
        return Err(WorkspaceError::EmptyWorkspace(build_dir.to_path_buf()));
    }
    Ok(units)
}

/// Load every compilation database in the workspace.
///
/// A single `build/compile_commands.json` wins when present; otherwise each
/// per-package `build/<pkg>/compile_commands.json` is loaded and merged,
/// deduplicating on the `(source, directory)` identity.
pub fn load_workspace(workspace_root: &Path) -> Result<Vec<CompileUnit>, WorkspaceError> {
    let build_root = workspace_root.join("build");
    if !build_root.is_dir() {
        return Err(WorkspaceError::NotFound(build_root));
    }
    if build_root.join(COMPILE_DB_FILE).is_file() {
        return load(&build_root);
    }

    let pattern = build_root.join("*").join(COMPILE_DB_FILE);
    let mut units: Vec<CompileUnit> = Vec::new();
    let mut seen: HashSet<(PathBuf, PathBuf)> = HashSet::new();
    let mut found_db = false;
    for entry in
        glob::glob(&pattern.to_string_lossy()).expect("bad glob pattern")
    {
        let Ok(db_path) = entry else { continue };
        let Some(dir) = db_path.parent() else { continue };
        found_db = true;
        match load(dir) {
            Ok(batch) => {
                for unit in batch {
                    if seen.insert((unit.source.clone(), unit.directory.clone())) {
                        units.push(unit);
                    }
                }
            }
            Err(WorkspaceError::EmptyWorkspace(_)) => {
                // A package may have compiled nothing; the workspace as a
                // whole still has to yield at least one unit.
            }
            Err(e) => return Err(e),
        }
    }
    if !found_db {
        return Err(WorkspaceError::NotFound(build_root.join(COMPILE_DB_FILE)));
    }
    if units.is_empty() {
        return Err(WorkspaceError::EmptyWorkspace(build_root));
    }
    Ok(units)
}
