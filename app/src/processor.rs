// ==============================================================================
// processor.rs - Core Annotation Pipeline
// ==============================================================================
// Description: Merges input variants with ANNOVAR output, allele frequency
//              tables and annotation tables into one table per input file
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Pass order is fixed:
//   1. ANNOVAR
//   2. allele frequency tables (declared order)
//   3. annotation tables (declared order)
// ==============================================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

use crate::annovar::{AnnovarBridge, AnnovarOutcome};
use crate::config::Config;
use crate::error::{AnnotateError, Result};
use crate::flatfile::{FlatFileJoiner, JoinMode};
use crate::models::Header;
use crate::output::write_table;
use crate::parsers::VariantTableParser;

/// Suffix of the merged table written for each input
pub const OUTPUT_SUFFIX: &str = "_varied.tsv";

/// Paths produced for one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// ANNOVAR input side file
    pub avinput: PathBuf,
    /// ANNOVAR output prefix
    pub annovar_prefix: PathBuf,
    /// Merged table
    pub table: PathBuf,
}

impl OutputPaths {
    pub fn for_input(input: &Path, output_dir: &Path) -> Result<Self> {
        let stem = input
            .file_stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AnnotateError::InvalidInputPath(input.to_path_buf()))?
            .to_string_lossy()
            .into_owned();

        Ok(Self {
            avinput: output_dir.join(format!("{}.avinput", stem)),
            annovar_prefix: output_dir.join(&stem),
            table: output_dir.join(format!("{}{}", stem, OUTPUT_SUFFIX)),
        })
    }
}

/// Per-file processing summary
#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub variants: usize,
    pub skipped_lines: usize,
    pub columns: usize,
    pub annovar: AnnovarOutcome,
}

/// Runs the annotation pipeline for input files against one configuration
#[derive(Debug, Clone)]
pub struct AnnotationProcessor {
    config: Arc<Config>,
    output_dir: PathBuf,
}

impl AnnotationProcessor {
    pub fn new(config: Arc<Config>, output_dir: PathBuf) -> Self {
        Self { config, output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Reject input sets where two files map to the same output paths
    ///
    /// Every output path derives from the file stem, so `a/calls.tsv` and
    /// `b/calls.tsv` would share an avinput, ANNOVAR prefix and result table.
    pub fn check_inputs(&self, inputs: &[PathBuf]) -> Result<()> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        for input in inputs {
            let paths = OutputPaths::for_input(input, &self.output_dir)?;
            if let Some(first) = claimed.insert(paths.table.clone(), input.as_path()) {
                return Err(AnnotateError::DuplicateOutput {
                    first: first.to_path_buf(),
                    second: input.clone(),
                    output: paths.table,
                });
            }
        }
        Ok(())
    }

    /// Annotate one input file and write `<stem>_varied.tsv`
    pub async fn process(&self, input: &Path) -> Result<ProcessReport> {
        let span = info_span!("annotate", input = %input.display());
        self.process_inner(input).instrument(span).await
    }

    async fn process_inner(&self, input: &Path) -> Result<ProcessReport> {
        let paths = OutputPaths::for_input(input, &self.output_dir)?;

        // 1. Index input variants, writing the avinput side file
        let parsed = VariantTableParser::new().parse(input, &paths.avinput)?;
        let mut index = parsed.index;
        let mut header = Header::new();
        info!(
            "Indexed {} variants ({} distinct) over {} chromosomes",
            index.len(),
            index.key_count(),
            index.chromosomes().len()
        );

        // 2. ANNOVAR
        let annovar = AnnovarBridge::new(self.config.annovar(), self.config.common.threads)
            .run(&mut index, &mut header, &paths.avinput, &paths.annovar_prefix)
            .await?;
        debug_assert!(index.has_uniform_width(header.len()));

        // 3. Allele frequency tables
        for table in self.config.frequency_tables() {
            debug!("Allele frequency table {} ({} populations)", table.name, table.populations.len());
            header.extend(table.header_columns());
            FlatFileJoiner::new(
                &table.db_path,
                JoinMode::Frequency {
                    populations: table.populations.len(),
                },
            )
            .join(&mut index)?;
            debug_assert!(index.has_uniform_width(header.len()));
        }

        // 4. Annotation tables
        for table in self.config.annotation_tables() {
            debug!("Annotation table {}", table.name);
            header.push(table.name.clone());
            FlatFileJoiner::new(&table.db_path, JoinMode::Annotation).join(&mut index)?;
            debug_assert!(index.has_uniform_width(header.len()));
        }

        // 5. Merged table
        write_table(&paths.table, &header, index.records())?;

        Ok(ProcessReport {
            input: input.to_path_buf(),
            output: paths.table,
            variants: index.len(),
            skipped_lines: parsed.skipped,
            columns: header.len(),
            annovar,
        })
    }
}
