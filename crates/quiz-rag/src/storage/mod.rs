//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for indexed collections.

mod database;

pub use database::{CollectionDb, StoredSegment, SCHEMA_VERSION};
