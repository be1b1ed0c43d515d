//! Records service
//!
//! Reconciles the record store with the blob store. A record's image is
//! the object named `<id>.jpg`; nothing else links the two stores, so every
//! mutation here is a sequence of independent calls.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::DEFAULT_CONTENT_TYPE;
use crate::database::{NewRecord, Record, RecordChanges, RecordView};
use crate::error::Result;
use crate::storage::{image_key, BlobStore, RecordStore};

/// An image supplied with a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, DEFAULT_CONTENT_TYPE)
    }
}

/// Result of deleting a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: i64,
    /// The row is gone but its image could not be removed
    pub orphaned_image: bool,
}

/// Service coordinating both stores
#[derive(Clone)]
pub struct RecordsService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    bucket: String,
}

impl RecordsService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            records,
            blobs,
            bucket: bucket.into(),
        }
    }

    /// List all records in store order, each with its image URL
    ///
    /// URLs are resolved concurrently and are not checked for existence.
    pub async fn list_records(&self) -> Result<Vec<RecordView>> {
        let records = self.records.select().await?;

        let urls = join_all(
            records
                .iter()
                .map(|record| async move {
                    self.blobs.public_url(&self.bucket, &image_key(record.id)).await
                }),
        )
        .await;

        let views = records
            .into_iter()
            .zip(urls)
            .map(|(record, url)| url.map(|image_url| RecordView { record, image_url }))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Listed {} records", views.len());
        Ok(views)
    }

    /// Insert a record, then upload its image under the assigned id
    ///
    /// If the upload fails the new row is deleted again, so a failed create
    /// leaves neither a row nor an object behind.
    pub async fn create_record(
        &self,
        record: NewRecord,
        image: Option<&ImageUpload>,
    ) -> Result<Record> {
        tracing::info!("Creating record: {}", record.name);

        let created = self.records.insert(&record).await?;

        if let Some(image) = image {
            let key = image_key(created.id);
            if let Err(e) = self
                .blobs
                .upload(&self.bucket, &key, &image.bytes, &image.content_type)
                .await
            {
                tracing::warn!(
                    "Image upload for record {} failed, removing the row: {}",
                    created.id,
                    e
                );
                if let Err(undo) = self.records.delete(created.id).await {
                    tracing::error!(
                        "Could not remove record {} after failed upload: {}",
                        created.id,
                        undo
                    );
                }
                return Err(e);
            }
        }

        tracing::info!("Record created: {}", created.id);
        Ok(created)
    }

    /// Update a record's fields, then replace its image if one was supplied
    ///
    /// The old object is removed before the new one is uploaded. A crash
    /// between the two leaves the record without an image.
    pub async fn update_record(
        &self,
        id: i64,
        changes: RecordChanges,
        image: Option<&ImageUpload>,
    ) -> Result<()> {
        tracing::info!("Updating record: {}", id);

        self.records.update(id, &changes).await?;

        if let Some(image) = image {
            let key = image_key(id);

            if let Err(e) = self.blobs.remove(&self.bucket, &[key.clone()]).await {
                tracing::warn!("Removing old image {} failed, uploading anyway: {}", key, e);
            }

            self.blobs
                .upload(&self.bucket, &key, &image.bytes, &image.content_type)
                .await?;
        }

        tracing::info!("Record updated: {}", id);
        Ok(())
    }

    /// Delete a record's row, then its image
    ///
    /// Row deletion failures propagate. Image removal is best effort: a
    /// failure is logged and reported as an orphaned image.
    pub async fn delete_record(&self, id: i64) -> Result<DeleteOutcome> {
        tracing::info!("Deleting record: {}", id);

        self.records.delete(id).await?;

        let key = image_key(id);
        let orphaned_image = match self.blobs.remove(&self.bucket, &[key.clone()]).await {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!("Record {} deleted but image {} remains: {}", id, key, e);
                true
            }
        };

        tracing::info!("Record deleted: {}", id);
        Ok(DeleteOutcome { id, orphaned_image })
    }
}
