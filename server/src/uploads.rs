//! # Upload store
//!
//! Uploaded images are written to a single directory under timestamp-based names and served back
//! under [`UPLOADS_ROUTE`]. Documents refer to them by the relative path returned from
//! [`UploadStore::store()`].

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use axum::body::Bytes;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tower_http::services::ServeDir;
use tracing::debug;

/// Route prefix under which uploaded files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Prefix of the paths stored in documents.
const STORED_PATH_PREFIX: &str = "uploads";

/// Longest file extension kept from the client's file name.
const MAX_EXTENSION_LEN: usize = 16;

/// Number of successive timestamps tried before giving up on finding a free name.
const MAX_NAME_ATTEMPTS: i64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no free upload file name after {MAX_NAME_ATTEMPTS} attempts")]
    NamesExhausted,
}

/// A file received in a request, not yet persisted.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as sent by the client
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Opens the upload directory, creating it if it does not exist.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a file under a new name and returns the path to record in the owning document.
    ///
    /// The name is the current Unix time in milliseconds followed by the extension of the client's
    /// file name. If that name is taken, the next millisecond is tried, so concurrent uploads never
    /// overwrite each other.
    pub async fn store(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let extension = file_extension(file.file_name.as_deref());
        let now = chrono::Utc::now().timestamp_millis();
        for stamp in now..now + MAX_NAME_ATTEMPTS {
            let name = format!("{stamp}{extension}");
            let mut handle = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&name))
                .await
            {
                Ok(handle) => handle,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            handle.write_all(&file.bytes).await?;
            handle.flush().await?;
            debug!("stored upload {name} ({} bytes)", file.bytes.len());
            return Ok(format!("{STORED_PATH_PREFIX}/{name}"));
        }
        Err(UploadError::NamesExhausted)
    }

    /// Returns a service serving the stored files, with content types guessed from extensions.
    #[must_use]
    pub fn service(&self) -> ServeDir {
        ServeDir::new(&self.dir)
    }
}

/// Returns the extension of a client-supplied file name, including the leading dot.
///
/// Anything that is not a short alphanumeric extension is dropped.
fn file_extension(file_name: Option<&str>) -> String {
    file_name
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
