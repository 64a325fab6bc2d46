//! Raw schema of `compile_commands.json` entries.
//!
//! Entries carry either an `arguments` array or a `command` shell string;
//! both forms appear in real databases depending on the generator.

use crate::models::CompileUnit;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize)]
/// One record of the compilation database, as written by the build system.
pub struct CompileCommand {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CompileCommand {
    /// Convert a raw record into a `CompileUnit`.
    ///
    /// Returns `None` when `file` or `directory` is missing; such records are
    /// skipped with a warning by the loader. Relative source paths are
    /// resolved against the record's directory.
    pub fn into_unit(self) -> Option<CompileUnit> {
        if self.file.is_empty() || self.directory.is_empty() {
            return None;
        }
        let directory = PathBuf::from(self.directory);
        let file = PathBuf::from(self.file);
        let source = if file.is_absolute() {
            file
        } else {
            directory.join(file)
        };
        let arguments = match (self.arguments, self.command) {
            (Some(args), _) => args,
            (None, Some(cmd)) => cmd.split_whitespace().map(str::to_string).collect(),
            (None, None) => Vec::new(),
        };
        Some(CompileUnit {
            source,
            directory,
            arguments,
            package: None,
        })
    }
}
