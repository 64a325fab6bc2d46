//! Fix-record schema in the layout clang tools write with `--export-fixes`
//! and `clang-apply-replacements` consumes (`TranslationUnitReplacements`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One suggested source edit: replace `length` bytes at `offset` in
/// `file_path` with `text`.
pub struct Replacement {
    #[serde(rename = "FilePath")]
    pub file_path: String,
    #[serde(rename = "Offset")]
    pub offset: usize,
    #[serde(rename = "Length")]
    pub length: usize,
    #[serde(rename = "ReplacementText")]
    pub text: String,
}

impl Replacement {
    /// Byte-range overlap check within the same file. Zero-length insertions
    /// never overlap.
    pub fn overlaps(&self, other: &Replacement) -> bool {
        self.file_path == other.file_path
            && self.offset < other.offset + other.length
            && other.offset < self.offset + self.length
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// One unit's exported fixes, or the aggregated fix set on export.
pub struct FixRecord {
    #[serde(rename = "MainSourceFile", default)]
    pub main_source_file: String,
    #[serde(rename = "Replacements", default)]
    pub replacements: Vec<Replacement>,
}
