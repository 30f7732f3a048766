// ==============================================================================
// lib.rs - Variant Annotation Library
// ==============================================================================
// Description: Library interface for the variant annotation merger
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

pub mod annovar;
pub mod config;
pub mod error;
pub mod flatfile;
pub mod index;
pub mod models;
pub mod output;
pub mod parsers;
pub mod processor;

pub use annovar::{AnnovarBridge, AnnovarOutcome, SkipReason};
pub use config::Config;
pub use error::AnnotateError;
pub use flatfile::{FlatFileJoiner, JoinMode};
pub use index::{PassSummary, VariantIndex};
pub use models::{Header, VariantKey, MISSING_VALUE};
pub use processor::{AnnotationProcessor, ProcessReport};
