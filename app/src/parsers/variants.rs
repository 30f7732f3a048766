// ==============================================================================
// parsers/variants.rs - Input Variant Table Parser
// ==============================================================================
// Description: Reads input variant lines into a VariantIndex and writes the
//              ANNOVAR input (avinput) side file
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited, at least 4 columns, extra columns ignored
// Example:
//   chr1    100    A     T
//   chr1    250    AG    A
// avinput line for the second record:
//   1    250    251    AG    A
// ==============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{AnnotateError, Result};
use crate::index::VariantIndex;
use crate::models::VariantKey;
use crate::parsers::tsv_reader;

/// Outcome of parsing one input file
#[derive(Debug)]
pub struct ParsedVariants {
    pub index: VariantIndex,
    /// Lines skipped as malformed
    pub skipped: usize,
}

/// Parser for input variant tables
#[derive(Debug, Clone, Default)]
pub struct VariantTableParser;

impl VariantTableParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `input`, writing one avinput line per accepted record to `avinput`
    ///
    /// Malformed lines (fewer than 4 columns, non-numeric position) are
    /// skipped with a warning and do not consume a row position.
    pub fn parse(&self, input: &Path, avinput: &Path) -> Result<ParsedVariants> {
        let mut reader = tsv_reader(input)?;
        let file = File::create(avinput).map_err(|e| AnnotateError::io(avinput, e))?;
        let mut writer = BufWriter::new(file);

        let mut index = VariantIndex::new();
        let mut skipped = 0;

        for result in reader.records() {
            let record = result.map_err(|e| AnnotateError::csv(input, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.len() < 4 {
                warn!(
                    "{}:{}: expected at least 4 columns, found {}; line skipped",
                    input.display(),
                    line,
                    record.len()
                );
                skipped += 1;
                continue;
            }

            let key = VariantKey::new(&record[0], &record[1], &record[2], &record[3]);

            let Some(end) = end_position(&key.position, &key.ref_allele) else {
                warn!(
                    "{}:{}: invalid position '{}' for ref '{}'; line skipped",
                    input.display(),
                    line,
                    key.position,
                    key.ref_allele
                );
                skipped += 1;
                continue;
            };

            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                key.chromosome, key.position, end, key.ref_allele, key.alt_allele
            )
            .map_err(|e| AnnotateError::io(avinput, e))?;

            index.insert(key);
        }

        writer.flush().map_err(|e| AnnotateError::io(avinput, e))?;

        debug!(
            "Parsed {} variants ({} distinct keys, {} skipped) from {:?}",
            index.len(),
            index.key_count(),
            skipped,
            input
        );

        Ok(ParsedVariants { index, skipped })
    }
}

/// Last reference base covered by the variant: start + len(ref) - 1
///
/// An empty reference allele yields the start position. `None` when the
/// position is not a number or the end does not fit in a u64.
fn end_position(position: &str, ref_allele: &str) -> Option<u64> {
    let start = position.parse::<u64>().ok()?;
    let span = ref_allele.len().max(1) as u64;
    start.checked_add(span - 1)
}
