//! Hosted backend
//!
//! REST implementations of `RecordStore` and `BlobStore` for a hosted
//! backend-as-a-service project (table API plus object storage API).

pub mod client;
pub mod objects;
pub mod records;

pub use client::HostedClient;
pub use objects::RestBlobStore;
pub use records::RestRecordStore;
