//! Package discovery, unit ownership, and selection filtering.
//!
//! A directory containing a `package.xml` manifest is a package rooted
//! there. Discovery does not descend into matched directories, so a package
//! cannot contain a nested package for ownership purposes.

use crate::models::{CompileUnit, Package};
use crate::utils;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const PACKAGE_MANIFEST: &str = "package.xml";

const SKIPPED_TREES: [&str; 3] = ["build", "install", "log"];

#[derive(Debug, Clone, Default)]
/// Restricts a run to named packages and/or a base directory.
///
/// An empty package set means "all packages".
pub struct SelectionFilter {
    pub packages: BTreeSet<String>,
    pub base_path: Option<PathBuf>,
}

impl SelectionFilter {
    pub fn matches(&self, unit: &CompileUnit) -> bool {
        let package_ok = self.packages.is_empty()
            || unit
                .package
                .as_ref()
                .is_some_and(|p| self.packages.contains(p));
        let path_ok = self
            .base_path
            .as_ref()
            .map_or(true, |base| unit.source.starts_with(base));
        package_ok && path_ok
    }
}

/// Discover packages under the workspace.
///
/// Walks `workspace_root/src` when it exists, otherwise the root itself,
/// skipping hidden directories and the `build`/`install`/`log` trees.
/// Result is sorted by name for deterministic evaluation.
pub fn discover(workspace_root: &Path) -> Vec<Package> {
    let src = workspace_root.join("src");
    let search_root = if src.is_dir() {
        src
    } else {
        workspace_root.to_path_buf()
    };
    let mut packages = Vec::new();
    walk(&search_root, &mut packages);
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    packages
}

fn walk(dir: &Path, out: &mut Vec<Package>) {
    if dir.join(PACKAGE_MANIFEST).is_file() {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        out.push(Package {
            name,
            root: dir.to_path_buf(),
        });
        // No nested packages below a matched root.
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || SKIPPED_TREES.contains(&name.as_str()) {
            continue;
        }
        walk(&path, out);
    }
}

/// Assign each unit to the package whose root is the longest prefix of the
/// unit's source path. Unowned units are excluded with a warning.
pub fn assign(units: Vec<CompileUnit>, packages: &[Package]) -> Vec<CompileUnit> {
    let mut owned = Vec::new();
    for mut unit in units {
        let best = packages
            .iter()
            .filter(|p| unit.source.starts_with(&p.root))
            .max_by_key(|p| p.root.as_os_str().len());
        match best {
            Some(package) => {
                unit.package = Some(package.name.clone());
                owned.push(unit);
            }
            None => eprintln!(
                "{} {} is not owned by any package; skipping",
                utils::warn_prefix(),
                unit.source.display()
            ),
        }
    }
    owned
}

/// Pure, order-preserving selection. Idempotent for a fixed filter.
pub fn filter(units: &[CompileUnit], selection: &SelectionFilter) -> Vec<CompileUnit> {
    units
        .iter()
        .filter(|u| selection.matches(u))
        .cloned()
        .collect()
}

/// Selected package names that match no discovered package. The caller warns
/// and continues; an empty selection completes the run with no results.
pub fn unknown_selections(selection: &SelectionFilter, packages: &[Package]) -> Vec<String> {
    selection
        .packages
        .iter()
        .filter(|name| !packages.iter().any(|p| &p.name == *name))
        .cloned()
        .collect()
}
