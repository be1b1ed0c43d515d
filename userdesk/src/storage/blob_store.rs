//! Directory-backed blob storage
//!
//! Stores each object as a plain file named after its key, one
//! subdirectory per bucket.
//!
//! Example: key "7.jpg" in bucket "Img" is stored at "blobs/Img/7.jpg"

use crate::error::{AppError, Result};
use crate::storage::BlobStore;
use async_trait::async_trait;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Blob store rooted at a local directory
#[derive(Clone)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Create a new blob store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the blob store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Blob store initialized at: {:?}", self.root);
        Ok(())
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        validate_segment(bucket)?;
        Ok(self.root.join(bucket))
    }

    fn get_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_segment(key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

/// Buckets and keys are single path components
fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment.contains("..")
        || segment.contains(&['/', '\\', '\0'][..])
    {
        return Err(AppError::BlobStore(format!("Invalid object name: {:?}", segment)));
    }
    Ok(())
}

/// Write `data` to `temp_path`, then rename it to `path`
///
/// The temp file is removed if any step fails.
async fn write_atomically(temp_path: &Path, path: &Path, data: &[u8]) -> Result<()> {
    let written = async {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(temp_path, path).await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(temp_path).await {
            tracing::warn!("Failed to remove temp file {:?}: {}", temp_path, cleanup);
        }
        return Err(e.into());
    }

    Ok(())
}

#[async_trait]
impl BlobStore for DirBlobStore {
    async fn public_url(&self, bucket: &str, key: &str) -> Result<String> {
        let path = std::path::absolute(self.get_path(bucket, key)?)?;
        let url = Url::from_file_path(&path)
            .map_err(|_| AppError::BlobStore(format!("Cannot build URL for {:?}", path)))?;
        Ok(url.to_string())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let path = self.get_path(bucket, key)?;

        if path.exists() {
            return Err(AppError::BlobStore(format!(
                "Object already exists: {}/{}",
                bucket, key
            )));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        write_atomically(&temp_path, &path, data).await?;

        tracing::debug!(
            "Uploaded object: {}/{} ({} bytes, {})",
            bucket,
            key,
            data.len(),
            content_type
        );

        Ok(())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        for key in keys {
            let path = self.get_path(bucket, key)?;

            if !path.exists() {
                continue;
            }

            fs::remove_file(&path).await?;
            tracing::debug!("Removed object: {}/{}", bucket, key);
        }

        Ok(())
    }
}
