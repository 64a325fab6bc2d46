//! CLI argument parsing via `clap`.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wstidy",
    version,
    about = "Run a static-analysis checker across every package in a built workspace",
    long_about = "wstidy — discover packages and compile units in a built workspace and run \
clang-tidy (or a compatible checker) against every translation unit in parallel.\n\n\
Configuration precedence: CLI > wstidy.toml > defaults.",
    after_help = "Examples:\n  wstidy --jobs 8\n  wstidy --packages-select pkg_a pkg_b --verbose\n  wstidy --config-file .clang-tidy --export-fixes fixes.yaml\n  wstidy --base-path src/drivers --output-dir tidy-logs"
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(long, help = "Workspace root (default: current dir, detected upward)")]
    pub workspace_root: Option<String>,
    #[arg(long, help = "Checker executable to invoke (default: clang-tidy)")]
    pub checker_cmd: Option<String>,
    #[arg(
        long,
        help = "Checker configuration string; takes precedence over --config-file"
    )]
    pub config: Option<String>,
    #[arg(long, help = "Path to a checker configuration file")]
    pub config_file: Option<String>,
    #[arg(long, short = 'j', help = "Number of checker jobs to run in parallel")]
    pub jobs: Option<usize>,
    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        help = "Print the enabled-checks explanation and exit without analyzing"
    )]
    pub explain_config: bool,
    #[arg(long, value_name = "PATH", help = "Write the aggregated fix set to PATH")]
    pub export_fixes: Option<String>,
    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        help = "Apply aggregated fixes to source files in place"
    )]
    pub fix_errors: bool,
    #[arg(
        long,
        num_args = 1..,
        value_name = "PACKAGE_NAME",
        help = "Only process the named packages"
    )]
    pub packages_select: Vec<String>,
    #[arg(long, value_name = "PATH", help = "Only process units under PATH")]
    pub base_path: Option<String>,
    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        help = "Stream per-unit progress as units complete"
    )]
    pub verbose: bool,
    #[arg(long, value_name = "DIR", help = "Directory for per-unit checker output logs")]
    pub output_dir: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
}
