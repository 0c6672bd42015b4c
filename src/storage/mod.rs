//! Table persistence.
//!
//! Jobs read their input and write their results as CSV files under a data
//! directory. Output files are UTF-8 with a byte-order mark so that
//! spreadsheet tools detect the encoding, and are replaced atomically.

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Table;

pub use local::LocalStorage;

/// Metadata about a table write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Final location of the file
    pub path: PathBuf,
    /// Number of data rows written (header excluded)
    pub rows: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for table storage backends.
#[async_trait]
pub trait TableStorage: Send + Sync {
    /// Resolve a relative key (file name) to a path.
    fn path(&self, key: &str) -> PathBuf;

    /// Read a table with a header row.
    ///
    /// Fails with `MissingInputFile` if nothing is stored under `key`.
    async fn read_table(&self, key: &str) -> Result<Table>;

    /// Write a table, replacing whatever is stored under `key`.
    async fn write_table(&self, key: &str, table: &Table) -> Result<WriteMetadata>;

    /// Whether something is stored under `key`.
    async fn exists(&self, key: &str) -> bool;
}
