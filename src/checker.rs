//! External checker invocation.
//!
//! The checker is a black box behind the `Checker` trait: one invocation per
//! compile unit, producing an exit status, gcc-style diagnostics on stdout,
//! and optionally a fix record written to a path we hand it. The default
//! implementation drives clang-tidy.

use crate::models::fix::FixRecord;
use crate::models::{AnalysisResult, CompileUnit, Diagnostic, Severity};
use crate::scheduler::CancelToken;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_POLL: Duration = Duration::from_millis(25);

/// Checker configuration as resolved from the CLI/config file.
///
/// An explicit `config` string takes precedence over `config_file` when both
/// are set, matching clang-tidy's own precedence rule.
#[derive(Debug, Clone, Default)]
pub struct CheckerConfig {
    pub config: Option<String>,
    pub config_file: Option<PathBuf>,
}

impl CheckerConfig {
    fn flags(&self) -> Vec<String> {
        if let Some(cfg) = &self.config {
            vec![format!("--config={cfg}")]
        } else if let Some(file) = &self.config_file {
            vec![format!("--config-file={}", file.display())]
        } else {
            Vec::new()
        }
    }
}

/// Fixed seam between the scheduler and the external tool. Swap in a fake
/// for tests; the real implementation spawns one process per unit.
pub trait Checker: Send + Sync {
    fn invoke(
        &self,
        unit: &CompileUnit,
        fixes_path: Option<&Path>,
        cancel: &CancelToken,
    ) -> AnalysisResult;
}

/// The clang-tidy process checker.
pub struct ClangTidy {
    command: String,
    config: CheckerConfig,
    /// Package name -> package root, for `--header-filter`.
    package_roots: HashMap<String, PathBuf>,
    diag_re: Regex,
}

impl ClangTidy {
    pub fn new(
        command: impl Into<String>,
        config: CheckerConfig,
        package_roots: HashMap<String, PathBuf>,
    ) -> Self {
        Self {
            command: command.into(),
            config,
            package_roots,
            diag_re: diagnostic_regex(),
        }
    }

    /// Build the per-unit argument vector.
    pub fn build_args(&self, unit: &CompileUnit, fixes_path: Option<&Path>) -> Vec<String> {
        let mut args = Vec::new();
        args.push("-p".to_string());
        args.push(unit.directory.to_string_lossy().to_string());
        if let Some(root) = unit
            .package
            .as_ref()
            .and_then(|name| self.package_roots.get(name))
        {
            args.push(format!("--header-filter={}/.*", root.display()));
        }
        args.extend(self.config.flags());
        if let Some(path) = fixes_path {
            args.push(format!("--export-fixes={}", path.display()));
        }
        args.push(unit.source.to_string_lossy().to_string());
        args
    }

    /// Query the enabled-checks explanation without running any analysis.
    pub fn explain_config(&self) -> std::io::Result<String> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--explain-config");
        cmd.args(self.config.flags());
        let out = cmd.output()?;
        let mut text = String::from_utf8_lossy(&out.stdout).to_string();
        if !out.status.success() {
            text.push_str(&String::from_utf8_lossy(&out.stderr));
        }
        Ok(text)
    }

    fn parse_diagnostics(&self, stdout: &str) -> Vec<Diagnostic> {
        stdout
            .lines()
            .filter_map(|line| {
                let caps = self.diag_re.captures(line)?;
                let severity = match &caps[4] {
                    "error" => Severity::Error,
                    "warning" => Severity::Warning,
                    _ => Severity::Note,
                };
                Some(Diagnostic {
                    file: caps[1].to_string(),
                    line: caps[2].parse().ok()?,
                    column: caps[3].parse().ok()?,
                    severity,
                    check: caps.get(6).map(|m| m.as_str().to_string()).unwrap_or_default(),
                    message: caps[5].to_string(),
                })
            })
            .collect()
    }
}

fn diagnostic_regex() -> Regex {
    Regex::new(r"^(.+?):(\d+):(\d+):\s+(error|warning|note):\s+(.*?)(?:\s+\[([^\[\]]+)\])?$")
        .expect("diagnostic regex")
}

impl Checker for ClangTidy {
    fn invoke(
        &self,
        unit: &CompileUnit,
        fixes_path: Option<&Path>,
        cancel: &CancelToken,
    ) -> AnalysisResult {
        let started = Instant::now();
        let mut cmd = Command::new(&self.command);
        cmd.args(self.build_args(unit, fixes_path))
            .current_dir(&unit.directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return failed_result(unit, 127, format!("failed to start checker: {e}"), started)
            }
        };

        // Drain pipes on reader threads so the poll loop below can kill the
        // child on cancellation without deadlocking on a full pipe.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_handle = thread::spawn(move || drain(stdout_pipe));
        let stderr_handle = thread::spawn(move || drain(stderr_pipe));

        let mut interrupted = false;
        let status = loop {
            if cancel.is_cancelled() && !interrupted {
                let _ = child.kill();
                interrupted = true;
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(WAIT_POLL),
                Err(_) => {
                    let _ = child.kill();
                    interrupted = true;
                    thread::sleep(WAIT_POLL);
                }
            }
        };

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();
        let diagnostics = self.parse_diagnostics(&stdout);
        let fixes: Option<FixRecord> = fixes_path
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|s| serde_yaml::from_str(&s).ok());

        AnalysisResult {
            unit: unit.clone(),
            exit_code: status.code().unwrap_or(-1),
            diagnostics,
            fixes,
            stdout,
            stderr,
            duration_ms: started.elapsed().as_millis() as u64,
            interrupted,
        }
    }
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buf);
    }
    buf
}

fn failed_result(
    unit: &CompileUnit,
    exit_code: i32,
    stderr: String,
    started: Instant,
) -> AnalysisResult {
    AnalysisResult {
        unit: unit.clone(),
        exit_code,
        diagnostics: Vec::new(),
        fixes: None,
        stdout: String::new(),
        stderr,
        duration_ms: started.elapsed().as_millis() as u64,
        interrupted: false,
    }
}
