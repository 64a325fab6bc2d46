//! Workspace detection and effective settings resolution.
//!
//! wstidy reads `wstidy.toml` from the workspace root (or closest ancestor)
//! and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `checker.command`: `clang-tidy`
//! - `jobs`: 1 (sequential)
//! - `output`: `human`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::cli::Cli;
use crate::packages::SelectionFilter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// Checker-related configuration section under `[checker]`.
pub struct CheckerCfg {
    pub command: Option<String>,
    pub config: Option<String>,
    pub config_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `wstidy.toml`.
pub struct WstidyConfig {
    pub jobs: Option<usize>,
    pub output: Option<String>,
    pub output_dir: Option<String>,
    #[serde(default)]
    pub checker: Option<CheckerCfg>,
}

#[derive(Debug, Clone)]
/// Fully-resolved options used by the pipeline after applying precedence.
pub struct Effective {
    pub workspace_root: PathBuf,
    pub checker_cmd: String,
    pub config: Option<String>,
    pub config_file: Option<PathBuf>,
    pub jobs: usize,
    pub output: String,
    pub output_dir: Option<PathBuf>,
    pub export_fixes: Option<PathBuf>,
    pub fix_errors: bool,
    pub explain_config: bool,
    pub verbose: bool,
    pub selection: SelectionFilter,
}

/// Walk upward from `start` to detect the workspace root.
///
/// Stops at a `wstidy.toml`, a directory holding a `build/` tree, or a
/// `.git` directory; falls back to `start`.
pub fn detect_workspace_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join("wstidy.toml").exists()
            || cur.join("build").is_dir()
            || cur.join(".git").exists()
        {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(parent) => cur = parent,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `WstidyConfig` from `wstidy.toml` if present.
pub fn load_config(root: &Path) -> Option<WstidyConfig> {
    let path = root.join("wstidy.toml");
    if !path.exists() {
        return None;
    }
    let data = fs::read_to_string(&path).ok()?;
    toml::from_str(&data).ok()
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Cli) -> Effective {
    let start = PathBuf::from(cli.workspace_root.as_deref().unwrap_or("."));
    let workspace_root = detect_workspace_root(&start);
    let cfg = load_config(&workspace_root).unwrap_or_default();
    let checker_cfg = cfg.checker.unwrap_or_default();

    let checker_cmd = cli
        .checker_cmd
        .clone()
        .or(checker_cfg.command)
        .unwrap_or_else(|| "clang-tidy".to_string());
    let config = cli.config.clone().or(checker_cfg.config);
    let config_file = cli
        .config_file
        .clone()
        .or(checker_cfg.config_file)
        .map(PathBuf::from);
    let jobs = cli.jobs.or(cfg.jobs).unwrap_or(1).max(1);
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let output_dir = cli
        .output_dir
        .clone()
        .or(cfg.output_dir)
        .map(PathBuf::from);

    Effective {
        workspace_root,
        checker_cmd,
        config,
        config_file,
        jobs,
        output,
        output_dir,
        export_fixes: cli.export_fixes.clone().map(PathBuf::from),
        fix_errors: cli.fix_errors,
        explain_config: cli.explain_config,
        verbose: cli.verbose,
        selection: SelectionFilter {
            packages: cli.packages_select.iter().cloned().collect(),
            base_path: cli.base_path.clone().map(PathBuf::from),
        },
    }
}
