//! Capability-scoped filesystem archive for rendered reports.
//!
//! Writes go to a staging name first and are renamed into place so a reader
//! never observes a half-written PDF.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use uuid::Uuid;

use crate::domain::ports::{ReportArchive, ReportArchiveError};

/// Stores reports as files inside one directory.
#[derive(Debug, Clone)]
pub struct FileReportArchive {
    dir: Arc<Dir>,
}

impl FileReportArchive {
    /// Open `path`, creating it and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir: Arc::new(dir) })
    }
}

fn validate_file_name(file_name: &str) -> Result<(), ReportArchiveError> {
    let plain = !file_name.is_empty()
        && !file_name.starts_with('.')
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if plain {
        Ok(())
    } else {
        Err(ReportArchiveError::write(file_name, "file name is not a plain name"))
    }
}

/// Staging names are unique per write so overlapping writers of the same
/// report never share a partial file.
fn staging_name(file_name: &str) -> String {
    format!(".{file_name}.{}.partial", Uuid::new_v4().simple())
}

fn write_atomically(dir: &Dir, file_name: &str, bytes: &[u8]) -> io::Result<()> {
    let staging = staging_name(file_name);
    let published = dir
        .write(&staging, bytes)
        .and_then(|()| dir.rename(&staging, dir, file_name));
    if published.is_err() {
        let _ = dir.remove_file(&staging);
    }
    published
}

#[async_trait]
impl ReportArchive for FileReportArchive {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<(), ReportArchiveError> {
        validate_file_name(file_name)?;
        let dir = Arc::clone(&self.dir);
        let name = file_name.to_owned();
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &name, &bytes))
            .await
            .map_err(|err| ReportArchiveError::write(file_name, err.to_string()))?
            .map_err(|err| ReportArchiveError::write(file_name, err.to_string()))
    }
}
