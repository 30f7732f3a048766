// ==============================================================================
// annovar.rs - ANNOVAR Bridge
// ==============================================================================
// Description: Runs table_annovar.pl on the avinput side file and joins its
//              multianno table back onto the variant rows
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Invocation (argument vector, no shell):
//   table_annovar.pl <avinput> <humandb> -buildver <bv> -remove --thread <n>
//       -protocol <p1,p2,..> -operation <g,r,f,..> -nastring . --outfile <prefix>
// Result: <prefix>.<buildver>_multianno.txt
//   Chr  Start  End  Ref  Alt  <annotation columns...>
// ==============================================================================

use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::AnnovarConfig;
use crate::error::{AnnotateError, Result};
use crate::index::{PassSummary, VariantIndex};
use crate::models::{Header, VariantKey, MISSING_VALUE};
use crate::parsers::tsv_reader_no_comments;

/// Leading multianno columns that repeat the avinput fields
const AVINPUT_COLUMNS: usize = 5;

/// Result of one ANNOVAR pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnovarOutcome {
    /// Annotation columns appended to header and records
    Applied(PassSummary),
    /// Pass skipped; header and records are unchanged
    Skipped(SkipReason),
}

/// Why an ANNOVAR pass did not touch the data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotConfigured,
    NoProtocols,
    SpawnFailed(String),
    TimedOut(u64),
    MissingResult(PathBuf),
    EmptyResult(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotConfigured => write!(f, "ANNOVAR not configured"),
            SkipReason::NoProtocols => write!(f, "no ANNOVAR protocols configured"),
            SkipReason::SpawnFailed(e) => write!(f, "failed to start ANNOVAR: {}", e),
            SkipReason::TimedOut(secs) => write!(f, "ANNOVAR timed out after {}s", secs),
            SkipReason::MissingResult(p) => write!(f, "ANNOVAR result not found: {:?}", p),
            SkipReason::EmptyResult(p) => write!(f, "ANNOVAR result is empty: {:?}", p),
        }
    }
}

/// Runs ANNOVAR for one input file and merges its output
pub struct AnnovarBridge<'a> {
    config: Option<&'a AnnovarConfig>,
    threads: usize,
}

impl<'a> AnnovarBridge<'a> {
    /// `config` is `None` when the tool is absent or not included
    pub fn new(config: Option<&'a AnnovarConfig>, threads: usize) -> Self {
        Self { config, threads }
    }

    /// Result table written by ANNOVAR for `prefix`
    pub fn result_path(prefix: &Path, buildver: &str) -> PathBuf {
        let mut name = prefix.as_os_str().to_os_string();
        name.push(format!(".{}_multianno.txt", buildver));
        PathBuf::from(name)
    }

    /// Argument vector (after the program) for table_annovar.pl
    pub fn arguments(
        config: &AnnovarConfig,
        threads: usize,
        avinput: &Path,
        prefix: &Path,
    ) -> Vec<OsString> {
        let (protocols, operations) = config.protocols();
        let mut args: Vec<OsString> = Vec::new();
        if config.interpreter.is_some() {
            args.push(config.script_path().into());
        }
        args.push(avinput.into());
        args.push(config.humandb_path.clone().into());
        args.push("-buildver".into());
        args.push(config.buildver.clone().into());
        args.push("-remove".into());
        args.push("--thread".into());
        args.push(threads.to_string().into());
        args.push("-protocol".into());
        args.push(protocols.join(",").into());
        args.push("-operation".into());
        args.push(operations.join(",").into());
        args.push("-nastring".into());
        args.push(MISSING_VALUE.into());
        args.push("--outfile".into());
        args.push(prefix.into());
        args
    }

    /// Run ANNOVAR and join its result onto `index`/`header`
    ///
    /// Tool-level problems skip the pass. A non-zero exit is only logged: the
    /// result table is merged whenever the run produced one. A result left
    /// over from an earlier run is removed first so it is never merged.
    /// Only I/O errors on the result table are returned as errors.
    pub async fn run(
        &self,
        index: &mut VariantIndex,
        header: &mut Header,
        avinput: &Path,
        prefix: &Path,
    ) -> Result<AnnovarOutcome> {
        let Some(config) = self.config else {
            debug!("ANNOVAR pass not configured");
            return Ok(AnnovarOutcome::Skipped(SkipReason::NotConfigured));
        };

        let result = Self::result_path(prefix, &config.buildver);
        match std::fs::remove_file(&result) {
            Ok(()) => debug!("Removed stale ANNOVAR result {:?}", result),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AnnotateError::io(&result, e)),
        }

        if let Some(reason) = self.invoke(config, avinput, prefix).await {
            warn!("Skipping ANNOVAR pass: {}", reason);
            return Ok(AnnovarOutcome::Skipped(reason));
        }

        if !result.is_file() {
            let reason = SkipReason::MissingResult(result);
            warn!("Skipping ANNOVAR pass: {}", reason);
            return Ok(AnnovarOutcome::Skipped(reason));
        }

        let outcome = merge_result(&result, index, header)?;
        if let AnnovarOutcome::Skipped(reason) = &outcome {
            warn!("Skipping ANNOVAR pass: {}", reason);
        }
        Ok(outcome)
    }

    /// Launch the tool and wait for it; `Some(reason)` when the pass must be skipped
    async fn invoke(
        &self,
        config: &AnnovarConfig,
        avinput: &Path,
        prefix: &Path,
    ) -> Option<SkipReason> {
        let (protocols, _) = config.protocols();
        if protocols.is_empty() {
            return Some(SkipReason::NoProtocols);
        }

        let program: OsString = match &config.interpreter {
            Some(interpreter) => interpreter.into(),
            None => config.script_path().into(),
        };
        let args = Self::arguments(config, self.threads, avinput, prefix);

        let log_path = {
            let mut name = prefix.as_os_str().to_os_string();
            name.push(".annovar.log");
            PathBuf::from(name)
        };
        let (stdout, stderr) = match tool_log(&log_path) {
            Ok(pair) => pair,
            Err(e) => return Some(SkipReason::SpawnFailed(e.to_string())),
        };

        info!("Running ANNOVAR: {:?} {:?}", program, args);

        let mut child = match Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return Some(SkipReason::SpawnFailed(e.to_string())),
        };

        let waited = match config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill ANNOVAR after timeout: {}", e);
                    }
                    return Some(SkipReason::TimedOut(limit.as_secs()));
                }
            },
            None => child.wait().await,
        };

        match waited {
            Ok(status) if status.success() => {
                debug!("ANNOVAR finished, log at {:?}", log_path);
                None
            }
            Ok(status) => {
                match status.code() {
                    Some(code) => warn!("ANNOVAR exited with code {}, see {:?}", code, log_path),
                    None => warn!("ANNOVAR terminated by signal, see {:?}", log_path),
                }
                None
            }
            Err(e) => Some(SkipReason::SpawnFailed(e.to_string())),
        }
    }
}

/// Log file shared by the tool's stdout and stderr
fn tool_log(path: &Path) -> std::io::Result<(Stdio, Stdio)> {
    let file = File::create(path)?;
    let clone = file.try_clone()?;
    Ok((Stdio::from(file), Stdio::from(clone)))
}

/// Join a multianno table onto `index`, extending `header` with its columns
///
/// The first line is the header; its first five columns repeat the avinput
/// fields. Rows are keyed by (Chr, Start, Ref, Alt).
pub fn merge_result(
    path: &Path,
    index: &mut VariantIndex,
    header: &mut Header,
) -> Result<AnnovarOutcome> {
    let mut reader = tsv_reader_no_comments(path)?;
    let mut records = reader.records();

    let Some(first) = records.next() else {
        return Ok(AnnovarOutcome::Skipped(SkipReason::EmptyResult(path.to_path_buf())));
    };
    let first = first.map_err(|e| AnnotateError::csv(path, e))?;
    let columns: Vec<String> = first.iter().skip(AVINPUT_COLUMNS).map(str::to_string).collect();

    let mut pass = index.begin_pass(columns.len());
    for result in records {
        let record = result.map_err(|e| AnnotateError::csv(path, e))?;
        if record.len() < AVINPUT_COLUMNS {
            continue;
        }
        let key = VariantKey::new(&record[0], &record[1], &record[3], &record[4]);
        let values: Vec<&str> = record.iter().skip(AVINPUT_COLUMNS).collect();
        pass.apply(&key, &values);
    }
    let summary = pass.finish();
    header.extend(columns);

    info!(
        "Merged ANNOVAR result {:?}: {} rows matched, {} rows filled ({} columns)",
        path, summary.matched, summary.filled, summary.width
    );
    Ok(AnnovarOutcome::Applied(summary))
}
