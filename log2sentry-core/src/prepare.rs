//! High-level pipeline: expand patterns, then plan, stage, transcode and
//! finalise each matched file in turn.
//!
//! # Responsibilities
//! - Strictly sequential: one input file at a time, one line at a time
//! - A fresh timestamp and [`PathSet`] per input file
//! - Failure isolation per input file: an error aborts that file, is logged
//!   and recorded, and the batch carries on
//!
//! # Navigation
//! - Main entrypoint: [`prepare_all`]
//! - Supporting types: [`PrepareContext`], [`BatchReport`]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Options;
use crate::contract::{client_identifier, Credentials, VersionProvider};
use crate::error::PrepareError;
use crate::finalize::finalize;
use crate::header::HeaderWriter;
use crate::plan::{generate_timestamp, PathSet};
use crate::stage::stage;
use crate::transcode::{is_json_log, transcode_file, UnitArtifacts};

/// Everything a batch needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct PrepareContext {
    pub options: Options,
    pub headers: HeaderWriter,
    pub temp_root: PathBuf,
}

impl PrepareContext {
    pub fn new(options: Options, credentials: Credentials, version: &dyn VersionProvider) -> Self {
        Self {
            options,
            headers: HeaderWriter::new(client_identifier(version), credentials),
            temp_root: std::env::temp_dir(),
        }
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }
}

/// Outcome for one successfully prepared input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub staged_file: PathBuf,
    pub output_dir: PathBuf,
    pub units: Vec<UnitArtifacts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub input: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub prepared: Vec<FileReport>,
    pub failed: Vec<FailedFile>,
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn unit_count(&self) -> usize {
        self.prepared.iter().map(|f| f.units.len()).sum()
    }
}

/// Expands `patterns` in order, dropping repeated matches. Bad patterns and
/// unreadable entries are logged and skipped.
pub fn expand_patterns(patterns: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for pattern in patterns {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Skipping invalid file pattern");
                continue;
            }
        };
        for entry in paths {
            match entry {
                Ok(path) => {
                    if seen.insert(path.clone()) {
                        matched.push(path);
                    }
                }
                Err(e) => warn!(pattern = %pattern, error = %e, "Skipping unreadable match"),
            }
        }
    }
    matched
}

/// Prepares every JSON log file matched by `patterns`.
pub fn prepare_all(patterns: &[String], ctx: &PrepareContext) -> BatchReport {
    info!(patterns = patterns.len(), "[PREPARE] Starting batch");
    let mut report = BatchReport::default();

    for path in expand_patterns(patterns) {
        // A match that vanished since expansion still counts as a failed file.
        if path.is_dir() || !is_json_log(&path) {
            debug!(path = %path.display(), "[PREPARE] Skipping non-JSON match");
            report.skipped.push(path);
            continue;
        }
        let input = std::path::absolute(&path).unwrap_or(path);
        match prepare_file(&input, ctx) {
            Ok(file_report) => report.prepared.push(file_report),
            Err(e) => {
                error!(input = %input.display(), error = %e, "[PREPARE][ERROR] Input file failed");
                report.failed.push(FailedFile {
                    input,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        prepared = report.prepared.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        units = report.unit_count(),
        "[PREPARE] Batch complete"
    );
    report
}

/// Prepares a single input file, which should be an absolute path.
pub fn prepare_file(input: &Path, ctx: &PrepareContext) -> Result<FileReport, PrepareError> {
    let timestamp = generate_timestamp();
    let paths = PathSet::plan(input, &ctx.options, &timestamp, &ctx.temp_root);
    info!(input = %input.display(), timestamp = %timestamp, "[PREPARE] Preparing input file");

    stage(input, &paths)?;
    let units = transcode_file(&paths, &ctx.headers)?;
    finalize(&paths, &ctx.options);

    info!(
        input = %input.display(),
        units = units.len(),
        output = %paths.output_work_dir.display(),
        "[PREPARE] Input file prepared"
    );
    let units = units
        .into_iter()
        .map(|unit| promoted(unit, &paths))
        .collect();
    Ok(FileReport {
        input: input.to_path_buf(),
        staged_file: paths.staged_file.clone(),
        output_dir: paths.output_work_dir.clone(),
        units,
    })
}

// Units are written under the staging work dir; report where they ended up.
fn promoted(unit: UnitArtifacts, paths: &PathSet) -> UnitArtifacts {
    let relocate = |p: &Path| match p.file_name() {
        Some(name) => paths.output_work_dir.join(name),
        None => p.to_path_buf(),
    };
    UnitArtifacts {
        line_number: unit.line_number,
        data_file: relocate(&unit.data_file),
        header_file: relocate(&unit.header_file),
    }
}
