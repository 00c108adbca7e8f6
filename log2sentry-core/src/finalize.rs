//! Finalisation: promote the work directory and clean up after a successful
//! transcode. Every step here is best effort; failures are logged at debug
//! level and otherwise ignored, since the units already exist by this point.

use std::fs;

use tracing::debug;

use crate::config::Options;
use crate::plan::PathSet;
use crate::stage::{create_open_dir, move_path};

/// Moves the timestamped work directory under the output directory, then
/// removes the staged copy (unless `preserve_backup`) and a dedicated
/// staging directory.
pub fn finalize(paths: &PathSet, options: &Options) {
    if !paths.stages_in_place() {
        let promoted = create_open_dir(&paths.output_dir)
            .and_then(|_| move_path(&paths.staging_work_dir, &paths.output_work_dir));
        match promoted {
            Ok(()) => debug!(to = %paths.output_work_dir.display(), "Promoted work directory"),
            Err(e) => debug!(
                from = %paths.staging_work_dir.display(),
                to = %paths.output_work_dir.display(),
                error = %e,
                "Could not promote work directory"
            ),
        }
    }

    if !options.preserve_backup {
        if let Err(e) = fs::remove_file(&paths.staged_file) {
            debug!(path = %paths.staged_file.display(), error = %e, "Could not remove staged file");
        }
    }

    // Only succeeds once empty, so a preserved backup keeps its directory.
    if paths.dedicated_staging {
        if let Err(e) = fs::remove_dir(&paths.staging_dir) {
            debug!(
                path = %paths.staging_dir.display(),
                error = %e,
                "Could not remove staging directory"
            );
        }
    }
}
