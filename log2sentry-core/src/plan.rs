//! Path planning: where a single input file is staged, where its units are
//! written and how they are named.
//!
//! A [`PathSet`] is computed once per input file, from a timestamp generated
//! for that file, and never changes afterwards. Nothing here touches the
//! filesystem.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::config::Options;

/// Name prefix of the staged copy of an input file.
pub const STAGED_FILE_PREFIX: &str = "tmp_";

/// Name prefix of a dedicated staging directory under the system temp dir.
pub const TMP_STAGING_PREFIX: &str = "log2sentry_";

/// Width of the zero-padded line number in output names.
pub const LINE_NUMBER_WIDTH: usize = 6;

/// Local time as `YYYYmmddHHMMSSffffff`: sortable, fixed width, microsecond precision.
pub fn generate_timestamp() -> String {
    Local::now().format("%Y%m%d%H%M%S%6f").to_string()
}

/// Template for output names: `<base>_<timestamp><line:06><ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPattern {
    pub base: String,
    pub timestamp: String,
    pub ext: String,
}

impl OutputPattern {
    pub fn file_name(&self, line_number: usize) -> String {
        format!(
            "{}_{}{:0width$}{}",
            self.base,
            self.timestamp,
            line_number,
            self.ext,
            width = LINE_NUMBER_WIDTH
        )
    }
}

/// Every path derived for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSet {
    pub timestamp: String,
    /// Where the input file is moved to claim it.
    pub staging_dir: PathBuf,
    /// Final home of the timestamped work directory's parent.
    pub output_dir: PathBuf,
    /// `<staging_dir>/<timestamp>`: units are written here.
    pub staging_work_dir: PathBuf,
    /// `<output_dir>/<timestamp>`: where the work directory ends up.
    pub output_work_dir: PathBuf,
    /// `<staging_dir>/tmp_<timestamp><ext>`
    pub staged_file: PathBuf,
    pub output_pattern: OutputPattern,
    /// True when `staging_dir` was created for this file alone and may be removed.
    pub dedicated_staging: bool,
}

impl PathSet {
    /// Plans paths for `input`, which should be absolute.
    ///
    /// `temp_root` is the system temp directory, used only with `use_tmp_dir`.
    pub fn plan(input: &Path, options: &Options, timestamp: &str, temp_root: &Path) -> PathSet {
        let input_dir = input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let ext = input
            .extension()
            .and_then(OsStr::to_str)
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let output_dir = options.out_dir.clone().unwrap_or_else(|| input_dir.clone());
        let (staging_dir, dedicated_staging) = if options.use_tmp_dir {
            (temp_root.join(format!("{TMP_STAGING_PREFIX}{timestamp}")), true)
        } else {
            (output_dir.clone(), false)
        };

        let base = options.prefix.clone().unwrap_or(stem);

        PathSet {
            timestamp: timestamp.to_string(),
            staging_work_dir: staging_dir.join(timestamp),
            output_work_dir: output_dir.join(timestamp),
            staged_file: staging_dir.join(format!("{STAGED_FILE_PREFIX}{timestamp}{ext}")),
            staging_dir,
            output_dir,
            output_pattern: OutputPattern {
                base,
                timestamp: timestamp.to_string(),
                ext,
            },
            dedicated_staging,
        }
    }

    /// Path of the data file for a 1-based line number, inside the staging work directory.
    pub fn unit_path(&self, line_number: usize) -> PathBuf {
        self.staging_work_dir
            .join(self.output_pattern.file_name(line_number))
    }

    /// True when units are written straight into their final directory.
    pub fn stages_in_place(&self) -> bool {
        self.staging_work_dir == self.output_work_dir
    }
}
