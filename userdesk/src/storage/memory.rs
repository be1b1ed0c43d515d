//! In-memory store implementations.
//!
//! Both stores journal every call so tests can assert on what the
//! controller did and in which order. Failures can be injected per
//! operation kind.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::{NewRecord, Record, RecordChanges};
use crate::error::{AppError, Result};
use crate::storage::{BlobStore, RecordStore};

/// Record store call kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOp {
    Select,
    Insert,
    Update,
    Delete,
}

/// In-memory record store for testing.
///
/// Rows live in a `BTreeMap` so `select` returns them in id order.
/// Ids are assigned sequentially; data is lost when the store is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore {
    rows: Arc<RwLock<BTreeMap<i64, Record>>>,
    next_id: Arc<RwLock<i64>>,
    calls: Arc<RwLock<Vec<RecordOp>>>,
    failing: Arc<RwLock<HashSet<RecordOp>>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    /// Creates an empty store whose first id is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an empty store whose first assigned id is `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(RwLock::new(first_id)),
            calls: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Makes every subsequent call of `op` fail.
    pub async fn fail_on(&self, op: RecordOp) {
        self.failing.write().await.insert(op);
    }

    /// Removes all injected failures.
    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Returns the calls made so far, oldest first.
    pub async fn calls(&self) -> Vec<RecordOp> {
        self.calls.read().await.clone()
    }

    /// Returns a row without journaling the read.
    pub async fn get(&self, id: i64) -> Option<Record> {
        self.rows.read().await.get(&id).cloned()
    }

    async fn enter(&self, op: RecordOp) -> Result<()> {
        self.calls.write().await.push(op);
        if self.failing.read().await.contains(&op) {
            return Err(AppError::Backend {
                status: 503,
                message: format!("injected {:?} failure", op),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn select(&self) -> Result<Vec<Record>> {
        self.enter(RecordOp::Select).await?;
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn insert(&self, record: &NewRecord) -> Result<Record> {
        self.enter(RecordOp::Insert).await?;

        let mut next_id = self.next_id.write().await;
        let row = Record {
            id: *next_id,
            name: record.name.clone(),
            age: record.age,
            email: record.email.clone(),
        };
        *next_id += 1;

        self.rows.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: &RecordChanges) -> Result<()> {
        self.enter(RecordOp::Update).await?;

        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or(AppError::RecordNotFound(id))?;
        row.name = changes.name.clone();
        row.age = changes.age;
        row.email = changes.email.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.enter(RecordOp::Delete).await?;

        if self.rows.write().await.remove(&id).is_none() {
            return Err(AppError::RecordNotFound(id));
        }
        Ok(())
    }
}

/// Blob store call kinds, used for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOpKind {
    PublicUrl,
    Upload,
    Remove,
}

/// A journaled blob store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobOp {
    PublicUrl { bucket: String, key: String },
    Upload { bucket: String, key: String },
    Remove { bucket: String, keys: Vec<String> },
}

impl BlobOp {
    fn kind(&self) -> BlobOpKind {
        match self {
            BlobOp::PublicUrl { .. } => BlobOpKind::PublicUrl,
            BlobOp::Upload { .. } => BlobOpKind::Upload,
            BlobOp::Remove { .. } => BlobOpKind::Remove,
        }
    }
}

/// In-memory blob store for testing.
///
/// Like the hosted service, `upload` refuses to overwrite an existing key
/// and `remove` ignores missing keys.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
    journal: Arc<RwLock<Vec<BlobOp>>>,
    failing: Arc<RwLock<HashSet<BlobOpKind>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call of `kind` fail.
    pub async fn fail_on(&self, kind: BlobOpKind) {
        self.failing.write().await.insert(kind);
    }

    /// Removes all injected failures.
    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    /// Returns the calls made so far, oldest first.
    pub async fn journal(&self) -> Vec<BlobOp> {
        self.journal.read().await.clone()
    }

    /// Returns the mutating calls made so far, skipping URL lookups.
    pub async fn mutations(&self) -> Vec<BlobOp> {
        self.journal
            .read()
            .await
            .iter()
            .filter(|op| !matches!(op, BlobOp::PublicUrl { .. }))
            .cloned()
            .collect()
    }

    /// Returns the stored bytes for a key.
    pub async fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Returns the sorted keys of a bucket.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    async fn enter(&self, op: BlobOp) -> Result<()> {
        let kind = op.kind();
        self.journal.write().await.push(op);
        if self.failing.read().await.contains(&kind) {
            return Err(AppError::Backend {
                status: 503,
                message: format!("injected {:?} failure", kind),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn public_url(&self, bucket: &str, key: &str) -> Result<String> {
        self.enter(BlobOp::PublicUrl {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
        .await?;
        Ok(format!("memory://{}/{}", bucket, key))
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        self.enter(BlobOp::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
        .await?;

        let mut objects = self.objects.write().await;
        let slot = (bucket.to_string(), key.to_string());
        if objects.contains_key(&slot) {
            return Err(AppError::BlobStore(format!(
                "Object already exists: {}/{}",
                bucket, key
            )));
        }
        objects.insert(slot, data.to_vec());
        Ok(())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()> {
        self.enter(BlobOp::Remove {
            bucket: bucket.to_string(),
            keys: keys.to_vec(),
        })
        .await?;

        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(&(bucket.to_string(), key.clone()));
        }
        Ok(())
    }
}
