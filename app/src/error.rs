// ==============================================================================
// error.rs - Annotation Error Types
// ==============================================================================
// Description: Fatal error taxonomy for the annotation pipeline
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Only fatal conditions live here. Recoverable outcomes (tool not configured,
// tool timed out, result file absent) are reported through AnnovarOutcome and
// never surface as errors.
// ==============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort processing of an input file (and, from `main`, the run)
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Failed to find the config file: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}: No such file or directory", .0.display())]
    MissingDatabase(PathBuf),

    #[error("Failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input path has no usable file name: {}", .0.display())]
    InvalidInputPath(PathBuf),

    #[error(
        "Inputs {} and {} would both write {}",
        .first.display(),
        .second.display(),
        .output.display()
    )]
    DuplicateOutput {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read tab-separated data from {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl AnnotateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnnotateError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        AnnotateError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
