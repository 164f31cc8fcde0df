//! File-backed JSON storage shared by the Chronicle and pipeline run records.
//!
//! # Overview
//!
//! Every persisted document in devforge is a pretty-printed JSON file named
//! `{key}.json` inside a single directory. [`JsonStore`] owns that directory
//! and offers async save/load/list helpers built on `tokio::fs`. Writes are
//! flushed with `sync_all` before the call returns so that a successful save
//! is durable.
//!
//! # Usage
//!
//! ```rust,ignore
//! use devforge::storage::JsonStore;
//!
//! let store = JsonStore::new("data/chronicle");
//! let path = store.save("session_20250101_120000_3f9a1c2e_demo", &report).await?;
//! let keys = store.list().await?;
//! ```

mod json_store;

pub use json_store::{JsonStore, StorageError, StorageResult};
