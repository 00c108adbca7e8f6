//! Error types for the preparation pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// The credentials argument did not split into exactly two parts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("expected PUBLIC-KEY:SECRET-KEY, found {parts} colon-separated part(s)")]
    Malformed { parts: usize },
}

/// A failure that aborts the preparation of one input file.
/// Other input files in the same batch are unaffected.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("failed to stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compress line {line} of {path}: {source}")]
    Compress {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
