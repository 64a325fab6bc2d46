//! wstidy core library.
//!
//! This crate exposes programmatic APIs for discovering packages and compile
//! units in a built workspace and running an external static-analysis
//! checker against every translation unit in parallel.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Workspace detection and effective option resolution.
//! - `compdb`: Compilation database loading.
//! - `packages`: Package discovery, unit ownership, and selection filtering.
//! - `checker`: External checker interface and the clang-tidy driver.
//! - `scheduler`: Bounded-concurrency execution with cancellation.
//! - `fixes`: Fix-record aggregation, export, and in-place application.
//! - `report`: Run summary and per-unit artifact rendering.
//! - `output`: Human/JSON printers for progress, findings, and the summary.
//! - `models`: Data models for units, packages, diagnostics, and fixes.
//! - `error`: Fatal error taxonomy.
//! - `utils`: Console prefix helpers.
pub mod checker;
pub mod cli;
pub mod compdb;
pub mod config;
pub mod error;
pub mod fixes;
pub mod models;
pub mod output;
pub mod packages;
pub mod report;
pub mod scheduler;
pub mod utils;
