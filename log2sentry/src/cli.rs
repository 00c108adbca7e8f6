//! This module implements the CLI for log2sentry: argument parsing, credential
//! validation and the entrypoint that hands a batch to the core pipeline.
//!
//! All preparation logic (planning, staging, transcoding, headers) lives in
//! [`log2sentry-core`]. This module is strictly CLI glue.
//!
//! ## How To Use
//! - Command line: `log2sentry-prepare [options] PUBLIC-KEY:SECRET-KEY FILE-PATTERN...`
//! - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
//!
//! [`log2sentry-core`]: ../../log2sentry-core/

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log2sentry_core::config::Options;
use log2sentry_core::contract::{Credentials, StaticVersion, VersionProvider};
use log2sentry_core::prepare::{prepare_all, BatchReport, PrepareContext};
use std::path::PathBuf;

/// Split newline-delimited Sentry JSON logs into per-line upload units.
#[derive(Parser, Debug)]
#[clap(
    name = "log2sentry-prepare",
    version,
    about = "Prepare JSON log files for per-line upload to Sentry"
)]
pub struct Cli {
    /// Keep the staged copy of each input file after success
    #[clap(long)]
    pub preserve_backup: bool,

    /// Output base name instead of the input file's base name
    #[clap(long, value_name = "NAME", env = "LOG2SENTRY_PREFIX")]
    pub prefix: Option<String>,

    /// Write outputs (and, unless --use-tmp-dir, stage) under DIR
    #[clap(long, value_name = "DIR", env = "LOG2SENTRY_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Stage working files in a system temp directory
    #[clap(long)]
    pub use_tmp_dir: bool,

    /// Format of this tool's own diagnostics on stderr
    #[clap(long, value_enum, default_value_t = LogFormat::Text, env = "LOG2SENTRY_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Sentry key pair
    #[clap(value_name = "PUBLIC-KEY:SECRET-KEY", value_parser = parse_credentials)]
    pub credentials: Credentials,

    /// Glob patterns of JSON log files to prepare
    #[clap(value_name = "FILE-PATTERN", required = true, num_args = 1..)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    SentryJson,
}

fn parse_credentials(raw: &str) -> Result<Credentials, String> {
    raw.parse::<Credentials>().map_err(|e| e.to_string())
}

impl Cli {
    pub fn options(&self) -> Options {
        Options {
            preserve_backup: self.preserve_backup,
            prefix: self.prefix.clone(),
            out_dir: self.out_dir.clone(),
            use_tmp_dir: self.use_tmp_dir,
        }
    }
}

/// The version reported in header files: this binary's package version.
pub fn package_version() -> StaticVersion {
    StaticVersion::new(option_env!("CARGO_PKG_VERSION"))
}

/// Extracted CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli, version: &dyn VersionProvider) -> Result<BatchReport> {
    tracing::info!("prepare_started");

    let options = cli.options();
    options.trace_loaded();
    let ctx = PrepareContext::new(options, cli.credentials, version);
    tracing::info!(client = ctx.headers.client(), "Resolved client identifier");

    let report = prepare_all(&cli.patterns, &ctx);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => tracing::debug!(json = %json, "Batch report"),
        Err(e) => tracing::debug!(error = %e, "Failed to serialize batch report"),
    }

    tracing::info!(
        prepared = report.prepared.len(),
        failed = report.failed.len(),
        "prepare_finished"
    );
    Ok(report)
}
