//! Local disk storage for uploaded price lists
//!
//! Uploads are kept under a generated name until the worker has read them.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ingest::jobs::UploadedFile;

pub mod config;

#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    /// Create the upload directory if needed
    pub async fn new(config: &config::StorageConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .with_context(|| {
                format!("Failed to create upload directory {}", config.upload_dir.display())
            })?;

        info!("Upload storage initialized at {}", config.upload_dir.display());

        Ok(Self {
            dir: config.upload_dir.clone(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` under a fresh `<uuid>.<ext>` name
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn save(
        &self,
        original_name: &str,
        mime_type: Option<String>,
        data: &[u8],
    ) -> Result<UploadedFile> {
        let path = self.dir.join(stored_name(original_name));

        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;

        debug!("Stored upload {} at {}", original_name, path.display());

        Ok(UploadedFile {
            path,
            original_name: original_name.to_string(),
            mime_type,
            size: data.len() as u64,
        })
    }

    /// Delete a stored upload; a missing file is not an error
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} was already removed", path.display());
                Ok(())
            },
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove upload {}", path.display()))
            },
        }
    }
}

fn stored_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "csv".to_string());

    format!("{}.{}", Uuid::new_v4(), extension)
}
