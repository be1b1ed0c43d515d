//! userdesk library
//!
//! A user-record controller that keeps a record store and a per-record
//! image store in step. Exposed as a library for testing and embedding
//! behind any frontend.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod hosted;
pub mod services;
pub mod storage;
