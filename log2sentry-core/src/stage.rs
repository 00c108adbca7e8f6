//! Staging: claim an input file by moving it out of its original location.
//!
//! Once moved, the file no longer matches the original glob, so a second
//! invocation scanning the same pattern will not pick it up. This is
//! best-effort exclusion only: two runs listing the directory before either
//! has moved anything can still race.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::PrepareError;
use crate::plan::PathSet;

/// Creates `dir` and any missing parents, opening each new directory to
/// everyone regardless of the process umask. Existing directories are left
/// untouched.
pub fn create_open_dir(dir: &Path) -> io::Result<()> {
    let missing: Vec<&Path> = dir
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.is_dir())
        .collect();
    for new_dir in missing.into_iter().rev() {
        match fs::create_dir(new_dir) {
            Ok(()) => open_permissions(new_dir)?,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && new_dir.is_dir() => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn open_permissions(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o777))
}

#[cfg(not(unix))]
fn open_permissions(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Renames `from` to `to`. Only a cross-filesystem rename falls back to
/// copy-then-remove; any other failure is returned as is.
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "Rename crosses devices, copying instead"
            );
            if from.is_dir() {
                copy_dir(from, to)?;
                fs::remove_dir_all(from)
            } else {
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
        }
        Err(e) => Err(e),
    }
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// Moves `input` to `paths.staged_file`, then creates the staging work
/// directory. A failed move leaves no work directory behind, and a dedicated
/// staging directory is removed again.
pub fn stage(input: &Path, paths: &PathSet) -> Result<(), PrepareError> {
    create_open_dir(&paths.staging_dir).map_err(|source| PrepareError::Stage {
        path: paths.staging_dir.clone(),
        source,
    })?;
    if let Err(source) = move_path(input, &paths.staged_file) {
        if paths.dedicated_staging {
            let _ = fs::remove_dir(&paths.staging_dir);
        }
        return Err(PrepareError::Stage {
            path: input.to_path_buf(),
            source,
        });
    }
    create_open_dir(&paths.staging_work_dir).map_err(|source| PrepareError::Stage {
        path: paths.staging_work_dir.clone(),
        source,
    })?;
    info!(input = %input.display(), staged = %paths.staged_file.display(), "Staged input file");
    Ok(())
}
