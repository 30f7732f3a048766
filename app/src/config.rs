// ==============================================================================
// config.rs - Run Configuration
// ==============================================================================
// Description: TOML configuration for the ANNOVAR pass and flat-file databases
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Example:
//
//   [common]
//   threads = 4
//
//   [tools.annovar]
//   include = true
//   tool_path = "/opt/annovar"
//   humandb_path = "/opt/annovar/humandb"
//   buildver = "hg19"
//   gene_based_annotation = ["refGene"]
//   filter_based_annotation = ["exac03"]
//   timeout_secs = 3600
//
//   [[databases.allele_freq]]
//   name = "1000G"
//   include = true
//   db_path = "/data/1000G"
//   populations = ["ALL", "EAS"]
//
//   [[databases.annotation]]
//   name = "dbSNP"
//   include = true
//   db_path = "/data/dbsnp"
//
// Absent sections are not errors: they mean "nothing to run". An included
// section missing a required key (tool_path, humandb_path, buildver; name,
// db_path, populations) is dropped with a warning and its pass is skipped.
// ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AnnotateError, Result};

/// Whole run configuration, reduced to the passes that will actually run
///
/// Sections that are excluded, or included but missing a required key, are
/// dropped at load time; a dropped section skips its pass.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    annovar: Option<AnnovarConfig>,
    allele_freq: Vec<FrequencyTable>,
    annotation: Vec<AnnotationTable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    /// Thread count handed to ANNOVAR
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

fn default_threads() -> usize {
    1
}

/// Settings for table_annovar.pl
#[derive(Debug, Clone)]
pub struct AnnovarConfig {
    /// Directory holding table_annovar.pl
    pub tool_path: PathBuf,

    /// ANNOVAR database directory (humandb)
    pub humandb_path: PathBuf,

    /// Genome build, e.g. "hg19" or "hg38"
    pub buildver: String,

    pub gene_based_annotation: Vec<String>,
    pub region_based_annotation: Vec<String>,
    pub filter_based_annotation: Vec<String>,

    /// Program used to run the script (e.g. "perl"); run directly if unset
    pub interpreter: Option<String>,

    /// Kill the tool and skip the pass after this many seconds
    pub timeout_secs: Option<u64>,
}

impl AnnovarConfig {
    pub fn script_path(&self) -> PathBuf {
        self.tool_path.join("table_annovar.pl")
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Protocol names and matching operation codes (g, r, f), in that order
    pub fn protocols(&self) -> (Vec<&str>, Vec<&'static str>) {
        let groups: [(&Vec<String>, &'static str); 3] = [
            (&self.gene_based_annotation, "g"),
            (&self.region_based_annotation, "r"),
            (&self.filter_based_annotation, "f"),
        ];

        let mut protocols = Vec::new();
        let mut operations = Vec::new();
        for (names, code) in groups {
            for name in names {
                protocols.push(name.as_str());
                operations.push(code);
            }
        }
        (protocols, operations)
    }
}

/// Per-chromosome allele frequency table
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    pub name: String,
    pub db_path: PathBuf,
    pub populations: Vec<String>,
}

impl FrequencyTable {
    /// `<table>_<population>_Ref`, `<table>_<population>_Alt` per population
    pub fn header_columns(&self) -> Vec<String> {
        self.populations
            .iter()
            .flat_map(|pop| {
                [
                    format!("{}_{}_Ref", self.name, pop),
                    format!("{}_{}_Alt", self.name, pop),
                ]
            })
            .collect()
    }
}

/// Per-chromosome single-value annotation table
#[derive(Debug, Clone)]
pub struct AnnotationTable {
    pub name: String,
    pub db_path: PathBuf,
}

impl Config {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AnnotateError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| AnnotateError::io(path, e))?;
        let config = Self::parse(&content).map_err(|source| AnnotateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    /// Parse TOML text; only syntax and type errors fail
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(content)?;
        Ok(raw.resolve())
    }

    /// ANNOVAR settings, if included and complete
    pub fn annovar(&self) -> Option<&AnnovarConfig> {
        self.annovar.as_ref()
    }

    /// Runnable frequency tables, in declared order
    pub fn frequency_tables(&self) -> impl Iterator<Item = &FrequencyTable> {
        self.allele_freq.iter()
    }

    /// Runnable annotation tables, in declared order
    pub fn annotation_tables(&self) -> impl Iterator<Item = &AnnotationTable> {
        self.annotation.iter()
    }
}

// ------------------------------------------------------------------------------
// On-disk shape: every key optional, checked in resolve()
// ------------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default, alias = "Common")]
    common: CommonConfig,

    #[serde(default, alias = "Tools")]
    tools: RawTools,

    #[serde(default, alias = "Databases")]
    databases: RawDatabases,
}

#[derive(Debug, Default, Deserialize)]
struct RawTools {
    annovar: Option<RawAnnovar>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAnnovar {
    #[serde(default)]
    include: bool,
    tool_path: Option<PathBuf>,
    humandb_path: Option<PathBuf>,
    buildver: Option<String>,
    #[serde(default)]
    gene_based_annotation: Vec<String>,
    #[serde(default)]
    region_based_annotation: Vec<String>,
    #[serde(default)]
    filter_based_annotation: Vec<String>,
    interpreter: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabases {
    #[serde(default)]
    allele_freq: Vec<RawTable>,
    #[serde(default)]
    annotation: Vec<RawTable>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTable {
    name: Option<String>,
    #[serde(default)]
    include: bool,
    db_path: Option<PathBuf>,
    populations: Option<Vec<String>>,
}

/// Names of the keys whose flag is set
fn missing_keys(keys: &[(&'static str, bool)]) -> String {
    keys.iter()
        .filter(|(_, missing)| *missing)
        .map(|(key, _)| *key)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RawConfig {
    fn resolve(self) -> Config {
        let annovar = self.tools.annovar.and_then(RawAnnovar::resolve);
        let allele_freq = self
            .databases
            .allele_freq
            .into_iter()
            .enumerate()
            .filter_map(|(i, t)| t.resolve_frequency(i))
            .collect();
        let annotation = self
            .databases
            .annotation
            .into_iter()
            .enumerate()
            .filter_map(|(i, t)| t.resolve_annotation(i))
            .collect();

        Config {
            common: self.common,
            annovar,
            allele_freq,
            annotation,
        }
    }
}

impl RawAnnovar {
    fn resolve(self) -> Option<AnnovarConfig> {
        if !self.include {
            debug!("ANNOVAR section not included");
            return None;
        }
        match (self.tool_path, self.humandb_path, self.buildver) {
            (Some(tool_path), Some(humandb_path), Some(buildver)) => Some(AnnovarConfig {
                tool_path,
                humandb_path,
                buildver,
                gene_based_annotation: self.gene_based_annotation,
                region_based_annotation: self.region_based_annotation,
                filter_based_annotation: self.filter_based_annotation,
                interpreter: self.interpreter,
                timeout_secs: self.timeout_secs,
            }),
            (tool_path, humandb_path, buildver) => {
                warn!(
                    "ANNOVAR section is missing {}; ANNOVAR pass skipped",
                    missing_keys(&[
                        ("tool_path", tool_path.is_none()),
                        ("humandb_path", humandb_path.is_none()),
                        ("buildver", buildver.is_none()),
                    ])
                );
                None
            }
        }
    }
}

impl RawTable {
    fn label(&self, kind: &str, position: usize) -> String {
        match &self.name {
            Some(name) => format!("{} table {}", kind, name),
            None => format!("{} table #{}", kind, position + 1),
        }
    }

    fn resolve_frequency(self, position: usize) -> Option<FrequencyTable> {
        if !self.include {
            return None;
        }
        let label = self.label("allele_freq", position);
        match (self.name, self.db_path, self.populations) {
            (Some(name), Some(db_path), Some(populations)) if !populations.is_empty() => {
                Some(FrequencyTable {
                    name,
                    db_path,
                    populations,
                })
            }
            (name, db_path, populations) => {
                let missing = missing_keys(&[
                    ("name", name.is_none()),
                    ("db_path", db_path.is_none()),
                    ("populations", populations.map_or(true, |p| p.is_empty())),
                ]);
                warn!("{} is missing {}; table skipped", label, missing);
                None
            }
        }
    }

    fn resolve_annotation(self, position: usize) -> Option<AnnotationTable> {
        if !self.include {
            return None;
        }
        let label = self.label("annotation", position);
        match (self.name, self.db_path) {
            (Some(name), Some(db_path)) => Some(AnnotationTable { name, db_path }),
            (name, db_path) => {
                warn!(
                    "{} is missing {}; table skipped",
                    label,
                    missing_keys(&[("name", name.is_none()), ("db_path", db_path.is_none())])
                );
                None
            }
        }
    }
}
