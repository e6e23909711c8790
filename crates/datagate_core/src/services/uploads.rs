//! Dataset upload directory.
//!
//! Uploaded files are written as-is into one flat directory under the name
//! `<unix-millis>-<original basename>`. That stored name is the only handle a
//! client gets back, and downloads are resolved strictly inside the directory.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::GatewayError;
use crate::models::UploadReceipt;

/// Default upload size cap (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Attempts at finding a free stored name before giving up.
const MAX_NAME_ATTEMPTS: i64 = 64;

/// Flat directory of uploaded files.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    /// Create a store rooted at `dir`. Call [`UploadStore::init`] before use.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self { dir: dir.into(), max_bytes }
    }

    /// Upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Largest accepted upload in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Create the directory if it does not exist.
    pub async fn init(&self) -> Result<(), GatewayError> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => {
                return Err(GatewayError::config(format!(
                    "Upload path exists but is not a directory: {}",
                    self.dir.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(GatewayError::upload_failed_with_source(
                    format!("Cannot inspect upload directory '{}'", self.dir.display()),
                    e,
                ));
            }
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            GatewayError::upload_failed_with_source(
                format!("Failed to create upload directory '{}'", self.dir.display()),
                e,
            )
        })?;

        tracing::info!(dir = %self.dir.display(), "Upload directory created");
        Ok(())
    }

    /// Store `bytes` and return the receipt naming the stored file.
    ///
    /// Never overwrites an existing file.
    pub async fn save(
        &self,
        original_name: &str,
        mimetype: &str,
        bytes: &[u8],
    ) -> Result<UploadReceipt, GatewayError> {
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(GatewayError::UploadTooLarge { limit: self.max_bytes });
        }

        let base = basename(original_name);
        let mut stamp = Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let filename = format!("{stamp}-{base}");
            let path = self.dir.join(&filename);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    stamp += 1;
                    continue;
                }
                Err(e) => {
                    return Err(GatewayError::upload_failed_with_source(
                        format!("Failed to create '{}'", path.display()),
                        e,
                    ));
                }
            };

            if let Err(e) = write_all(&mut file, bytes).await {
                drop(file);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(GatewayError::upload_failed_with_source(
                    format!("Failed to write '{}'", path.display()),
                    e,
                ));
            }

            tracing::info!(filename = %filename, original = %original_name, size, "File stored");

            return Ok(UploadReceipt {
                filename,
                original_name: original_name.to_string(),
                size,
                mimetype: mimetype.to_string(),
                upload_date: Utc::now(),
            });
        }

        Err(GatewayError::UploadFailed {
            message: format!("No free stored name for '{base}'"),
            source: None,
        })
    }

    /// Read a stored file by the name returned from [`UploadStore::save`].
    ///
    /// Names that are not a single plain path component are treated as not
    /// found.
    pub async fn open(&self, filename: &str) -> Result<Vec<u8>, GatewayError> {
        let path = self.resolve(filename).ok_or_else(|| {
            tracing::warn!(filename, "Rejected download name");
            GatewayError::file_not_found(filename)
        })?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(GatewayError::file_not_found(filename)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GatewayError::file_not_found(filename));
            }
            Err(e) => return Err(e.into()),
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => GatewayError::file_not_found(filename),
            _ => GatewayError::from(e),
        })?;

        tracing::debug!(filename, size = bytes.len(), "File read");
        Ok(bytes)
    }

    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty() || filename.contains(['/', '\\', '\0']) {
            return None;
        }
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Some(self.dir.join(name)),
            _ => None,
        }
    }
}

async fn write_all(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// Last path segment of a client-supplied name, with either separator.
fn basename(original_name: &str) -> String {
    let last = original_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    match cleaned.as_str() {
        "" | "." | ".." => "upload".to_string(),
        _ => cleaned,
    }
}
