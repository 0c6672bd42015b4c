//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── key.txt                          # VWorld API key
//! ├── public_key.txt                   # Seoul open-data API key
//! ├── seoul_kiosk_list.csv             # kiosks job output, geocode input
//! ├── kiosk_locations_geocoded.csv     # geocode job output
//! ├── bank_location.csv                # search job output
//! └── kiosk_외식.csv                    # listing job output
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Table;
use crate::storage::{TableStorage, WriteMetadata};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

/// Parse CSV bytes (header row required, leading BOM tolerated).
pub fn decode_table(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut table = Table::new(reader.headers()?.iter());
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(String::from).collect());
    }
    Ok(table)
}

/// Serialize a table as BOM-prefixed CSV.
pub fn encode_table(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.into_inner().map_err(|e| AppError::Io(e.into_error()))
}

#[async_trait]
impl TableStorage for LocalStorage {
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn read_table(&self, key: &str) -> Result<Table> {
        let bytes = self
            .read_bytes(key)
            .await?
            .ok_or_else(|| AppError::MissingInputFile(self.path(key)))?;
        decode_table(&bytes)
    }

    async fn write_table(&self, key: &str, table: &Table) -> Result<WriteMetadata> {
        let bytes = encode_table(table)?;
        let path = self.write_bytes(key, &bytes).await?;
        log::debug!("Wrote {} rows to {}", table.len(), path.display());

        Ok(WriteMetadata {
            path,
            rows: table.len(),
            timestamp: Utc::now(),
        })
    }

    async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.path(key)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Table {
        let mut table = Table::new(["MGTNO", "ESBPLCADDR"]);
        table.push_row(vec!["K-1".into(), "서울특별시 중구 세종대로 110, 1층".into()]);
        table.push_row(vec!["K-2".into(), "서울특별시 종로구 \"삼봉로\" 43".into()]);
        table
    }

    #[tokio::test]
    async fn test_write_then_read_table() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let before = Utc::now();
        let meta = storage.write_table("out.csv", &sample()).await.unwrap();
        assert_eq!(meta.rows, 2);
        assert_eq!(meta.path, storage.root().join("out.csv"));
        assert!(meta.timestamp >= before);
        assert!(!tmp.path().join("out.tmp").exists());

        let table = storage.read_table("out.csv").await.unwrap();
        assert_eq!(table, sample());
    }

    #[tokio::test]
    async fn test_output_starts_with_bom() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_table("out.csv", &sample()).await.unwrap();
        let bytes = std::fs::read(tmp.path().join("out.csv")).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert!(bytes[UTF8_BOM.len()..].starts_with(b"MGTNO,ESBPLCADDR\n"));
    }

    #[tokio::test]
    async fn test_read_without_bom() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("in.csv"), "주소,이름\n서울 중구,a\n").unwrap();
        let storage = LocalStorage::new(tmp.path());

        let table = storage.read_table("in.csv").await.unwrap();
        assert_eq!(table.columns, vec!["주소", "이름"]);
        assert_eq!(table.rows, vec![vec!["서울 중구".to_string(), "a".to_string()]]);
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let err = storage.read_table("nope.csv").await.unwrap_err();
        assert!(matches!(err, AppError::MissingInputFile(_)));
        assert!(!storage.exists("nope.csv").await);
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_table("nested/dir/out.csv", &sample())
            .await
            .unwrap();
        assert!(storage.exists("nested/dir/out.csv").await);
    }
}
