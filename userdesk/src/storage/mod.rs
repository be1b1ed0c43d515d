//! Storage module
//!
//! Capability traits for the record and blob stores, the image key
//! convention, and the directory and in-memory backends.

pub mod blob_store;
pub mod memory;
pub mod traits;

pub use blob_store::DirBlobStore;
pub use memory::{BlobOp, BlobOpKind, InMemoryBlobStore, InMemoryRecordStore, RecordOp};
pub use traits::{BlobStore, RecordStore};

use crate::config::IMAGE_KEY_SUFFIX;

/// Object key holding the image for a record id
pub fn image_key(id: i64) -> String {
    format!("{}{}", id, IMAGE_KEY_SUFFIX)
}
