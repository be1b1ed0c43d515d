//! Database models
//!
//! Rust structs representing user rows and the payloads that write them.
//! All models use serde so they travel unchanged over the hosted REST API.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user row; `id` is assigned by the store and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: String,
}

/// Insert payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub age: i32,
    pub email: String,
}

/// Update payload; every field is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChanges {
    pub name: String,
    pub age: i32,
    pub email: String,
}

impl From<NewRecord> for RecordChanges {
    fn from(new: NewRecord) -> Self {
        Self {
            name: new.name,
            age: new.age,
            email: new.email,
        }
    }
}

/// A listed row merged with the public URL of its image
///
/// The URL is derived from the id alone and may point at an object that
/// was never uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "image")]
    pub image_url: String,
}
