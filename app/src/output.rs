// ==============================================================================
// output.rs - Merged Table Output
// ==============================================================================
// Description: Writes the merged header and rows as a tab-separated file
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// The table is written to a temporary file in the destination directory and
// renamed into place, so a failed run never leaves a truncated result.
// ==============================================================================

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{AnnotateError, Result};
use crate::models::Header;

/// Write `header` and `records` to `path` atomically
pub fn write_table(path: &Path, header: &Header, records: &[Vec<String>]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir).map_err(|e| AnnotateError::io(dir, e))?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .flexible(false)
        .from_writer(temp);

    writer
        .write_record(header.columns())
        .map_err(|e| AnnotateError::csv(path, e))?;
    for record in records {
        writer
            .write_record(record)
            .map_err(|e| AnnotateError::csv(path, e))?;
    }

    let mut temp = writer
        .into_inner()
        .map_err(|e| {
            let source = e.error();
            AnnotateError::io(path, std::io::Error::new(source.kind(), source.to_string()))
        })?;
    temp.flush().map_err(|e| AnnotateError::io(path, e))?;
    temp.persist(path)
        .map_err(|e| AnnotateError::io(path, e.error))?;

    info!("Wrote {} rows x {} columns to {:?}", records.len(), header.len(), path);
    Ok(())
}
