//! Storage layer for CampusGuide
//!
//! This crate provides the key-value persistence contract the application
//! state is built on, along with sled, JSON-file and in-memory backends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file;
pub mod kv;

pub use file::{FileKvStore, FileStoreConfig};
pub use kv::{
    get_json, scoped_key, set_json, KeyValueStore, KvConfig, KvError, MemoryKvStore,
    SledKvStore,
};
