// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for input variant tables and tab-separated sources
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use std::fs::File;
use std::path::Path;

use crate::error::{AnnotateError, Result};

pub mod variants;

pub use variants::{ParsedVariants, VariantTableParser};

/// Headerless, ragged, unquoted tab-separated reader with '#' comments
///
/// Blank lines are skipped and fields are trimmed.
pub fn tsv_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| AnnotateError::io(path, e))?;
    Ok(tsv_builder().comment(Some(b'#')).from_reader(file))
}

/// Same as `tsv_reader` but without comment handling, for tool output
pub fn tsv_reader_no_comments(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| AnnotateError::io(path, e))?;
    Ok(tsv_builder().from_reader(file))
}

fn tsv_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All);
    builder
}
