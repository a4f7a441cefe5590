use std::io::Write;
use std::path::{Path, PathBuf};

use custom_error::custom_error;
use tempdir::TempDir;
use tracing::{debug, info};

use crate::utils::sha256_hex;

custom_error! {
    pub StorageError
    IO { source: std::io::Error } = "Error while reading or writing: {source}",
    Persist { path: String, source: std::io::Error } = "Error while replacing {path}: {source}",
    InvalidPath { path: String } = "{path} does not name a file",
}

/// What a write did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub status: FileStatus,
    pub sha256: String,
}

pub fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            info!(
                "Directory at {} does not exist, creating it",
                parent_dir.display()
            );
            std::fs::create_dir_all(parent_dir)?;
        }
    }
    Ok(())
}

/// Returns the current contents of `path`, or `None` if it does not exist.
pub fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match std::fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Replaces `path` with `contents` in one rename. The data is staged in a
/// temporary directory next to the target so the rename never crosses
/// filesystems.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let file_name = path.file_name().ok_or_else(|| StorageError::InvalidPath {
        path: path.display().to_string(),
    })?;
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let staging = TempDir::new_in(parent_dir, ".mcassets")?;
    let staged = staging.path().join(file_name);
    {
        let mut file = std::fs::File::create(&staged)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    debug!("Staged {} bytes at {}", contents.len(), staged.display());

    std::fs::rename(&staged, path).map_err(|source| StorageError::Persist {
        path: path.display().to_string(),
        source,
    })?;
    staging.close()?;
    Ok(())
}

/// Writes `contents` to `path` and reports whether the file changed. The
/// parent directory must already exist.
pub fn store(path: &Path, contents: &[u8]) -> Result<WrittenFile, StorageError> {
    let sha256 = sha256_hex(contents);
    let status = match read_existing(path)? {
        None => FileStatus::Created,
        Some(previous) if previous == contents => FileStatus::Unchanged,
        Some(_) => FileStatus::Updated,
    };

    write_atomically(path, contents)?;
    info!("Written into: {}", path.display());
    debug!("{} sha256 {} ({:?})", path.display(), sha256, status);

    Ok(WrittenFile {
        path: path.to_path_buf(),
        status,
        sha256,
    })
}
