//! Capability traits for the two collaborators
//!
//! The controller only ever talks to a `RecordStore` and a `BlobStore`.
//! Hosted, local and in-memory backends all implement these.

use async_trait::async_trait;

use crate::database::{NewRecord, Record, RecordChanges};
use crate::error::Result;

/// A table of user rows keyed by a store-assigned integer id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every row in store order.
    async fn select(&self) -> Result<Vec<Record>>;

    /// Inserts a row and returns it with its assigned id.
    async fn insert(&self, record: &NewRecord) -> Result<Record>;

    /// Overwrites the fields of an existing row.
    async fn update(&self, id: i64, changes: &RecordChanges) -> Result<()>;

    /// Deletes a row by id.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// An object store holding at most one image per key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the public URL for a key without checking that it exists.
    async fn public_url(&self, bucket: &str, key: &str) -> Result<String>;

    /// Stores an object. Implementations may refuse to overwrite.
    async fn upload(&self, bucket: &str, key: &str, data: &[u8], content_type: &str)
        -> Result<()>;

    /// Removes objects; keys that do not exist are ignored.
    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<()>;
}
