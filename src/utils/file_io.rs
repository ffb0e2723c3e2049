use std::fs::create_dir_all;
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::error;

use crate::Result;
use crate::StorageError;

pub fn create_dir_if_not_exist(dir: &Path) -> Result<()> {
    if !dir.exists() {
        if let Err(e) = create_dir_all(dir) {
            error!("Failed to create directory {:?}: {:?}", dir, e);
            return Err(StorageError::PathError {
                path: dir.to_path_buf(),
                source: e,
            }
            .into());
        }
        debug!("created directory: {:?}", dir);
    }
    Ok(())
}

pub fn create_parent_dir_if_not_exist(path: &Path) -> Result<()> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() {
            create_dir_if_not_exist(parent_dir)?;
        }
    }
    Ok(())
}

pub fn open_file_for_append(path: PathBuf) -> Result<File> {
    create_parent_dir_if_not_exist(&path)?;
    let log_file = match OpenOptions::new().append(true).create(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            return Err(StorageError::PathError { path, source: e }.into());
        }
    };
    Ok(log_file)
}

/// Removes a file or directory tree if present. Missing targets are not an error.
pub(crate) fn remove_path_if_exists(path: &Path) -> Result<()> {
    let outcome = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match outcome {
        Ok(()) => {
            debug!("removed: {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::PathError {
            path: path.to_path_buf(),
            source: e,
        }
        .into()),
    }
}
