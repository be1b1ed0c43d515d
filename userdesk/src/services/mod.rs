//! Services module
//!
//! Business logic that coordinates the record store and the blob store,
//! and the controller holding view state on top of it.

pub mod controller;
pub mod records;

pub use controller::{
    Activity, Draft, FormState, ListState, RemoveOutcome, SaveOutcome, ViewController, ViewState,
};
pub use records::{DeleteOutcome, ImageUpload, RecordsService};
