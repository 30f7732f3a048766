// ==============================================================================
// flatfile.rs - Per-Chromosome Flat File Joiner
// ==============================================================================
// Description: Streams a directory of per-chromosome reference tables and
//              joins their value columns onto matching variant rows
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Layout: <db_path>/<chromosome>, one file per normalized chromosome name
// Line:   chromosome  position  ref  alt  value1 [value2 ...]
//   - allele frequency tables: 2 values per population (ref freq, alt freq)
//   - annotation tables: 1 value
// ==============================================================================

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AnnotateError, Result};
use crate::index::{PassSummary, VariantIndex};
use crate::models::VariantKey;
use crate::parsers::tsv_reader;

/// Kind of flat-file source, which fixes the number of appended fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Ref/alt allele frequency pair for each population
    Frequency { populations: usize },
    /// Single annotation value (e.g., an rsID)
    Annotation,
}

impl JoinMode {
    /// Fields appended to every row by one pass
    pub fn width(&self) -> usize {
        match self {
            JoinMode::Frequency { populations } => populations * 2,
            JoinMode::Annotation => 1,
        }
    }
}

/// Joins one flat-file database onto a VariantIndex
#[derive(Debug, Clone)]
pub struct FlatFileJoiner {
    db_path: PathBuf,
    mode: JoinMode,
}

impl FlatFileJoiner {
    pub fn new(db_path: impl Into<PathBuf>, mode: JoinMode) -> Self {
        Self {
            db_path: db_path.into(),
            mode,
        }
    }

    /// Run the pass, growing every record by `mode.width()` fields
    ///
    /// A missing database directory is fatal; a missing chromosome file only
    /// leaves that chromosome's rows to placeholder fill.
    pub fn join(&self, index: &mut VariantIndex) -> Result<PassSummary> {
        if !self.db_path.is_dir() {
            return Err(AnnotateError::MissingDatabase(self.db_path.clone()));
        }

        let chromosomes: Vec<String> = index.chromosomes().iter().cloned().collect();
        let mut pass = index.begin_pass(self.mode.width());

        for chromosome in &chromosomes {
            let table = self.db_path.join(chromosome);
            if !table.is_file() {
                debug!("No table for chromosome {} under {:?}", chromosome, self.db_path);
                continue;
            }
            stream_table(&table, |key, values| {
                pass.apply(key, values);
            })?;
            if pass.is_complete() {
                break;
            }
        }

        let summary = pass.finish();
        info!(
            "Joined {:?}: {} rows matched, {} rows filled ({} fields each)",
            self.db_path, summary.matched, summary.filled, summary.width
        );
        Ok(summary)
    }
}

/// Stream one table, handing each well-formed line's key and values to `on_line`
fn stream_table<F>(path: &Path, mut on_line: F) -> Result<()>
where
    F: FnMut(&VariantKey, &[&str]),
{
    let mut reader = tsv_reader(path)?;
    let mut record = csv::StringRecord::new();

    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|e| AnnotateError::csv(path, e))?;
        if !more {
            break;
        }
        if record.len() < 4 {
            continue;
        }
        let key = VariantKey::new(&record[0], &record[1], &record[2], &record[3]);
        let values: Vec<&str> = record.iter().skip(4).collect();
        on_line(&key, &values);
    }

    Ok(())
}
