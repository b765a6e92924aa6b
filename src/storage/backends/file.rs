//! JSON 文件存储
//!
//! Keeps the whole table in memory and rewrites the snapshot file on every
//! committed mutation. The write happens while the table lock is held, so
//! the file always matches some linearization point. A failed write undoes
//! the in-memory change before the lock is released.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error, info};

use crate::analytics::ClickSink;
use crate::errors::{Result, ShortenerError};
use crate::storage::MappingStore;
use crate::storage::models::{LinkId, ShortLink, StorageConfig};
use crate::storage::table::{LinkTable, TableSnapshot};

pub struct FileStore {
    file_path: PathBuf,
    table: RwLock<LinkTable>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let table = Self::load_from_file(&file_path)?;
        info!(
            "FileStore initialized with {} links from {}",
            table.len(),
            file_path.display()
        );

        Ok(FileStore {
            file_path,
            table: RwLock::new(table),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_file(path: &Path) -> Result<LinkTable> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(LinkTable::default()),
            Ok(content) => {
                let snapshot: TableSnapshot = serde_json::from_str(&content).map_err(|e| {
                    error!("Failed to parse links file {}: {}", path.display(), e);
                    ShortenerError::storage_unavailable(format!(
                        "Failed to parse links file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                LinkTable::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "Links file {} does not exist, creating an empty store",
                    path.display()
                );
                let table = LinkTable::default();
                Self::save_to_file(path, &table)?;
                Ok(table)
            }
            Err(e) => {
                error!("Failed to read links file {}: {}", path.display(), e);
                Err(ShortenerError::storage_unavailable(format!(
                    "Failed to read links file {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    /// 先写临时文件再 rename，避免半截文件
    fn save_to_file(path: &Path, table: &LinkTable) -> Result<()> {
        let json = serde_json::to_string_pretty(&table.snapshot())?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn persist(&self, table: &LinkTable) -> Result<()> {
        Self::save_to_file(&self.file_path, table).map_err(|e| {
            error!(
                "FileStore: failed to write {}: {}",
                self.file_path.display(),
                e
            );
            ShortenerError::storage_unavailable(format!(
                "Failed to persist links: {}",
                e.message()
            ))
        })
    }
}

#[async_trait]
impl MappingStore for FileStore {
    async fn insert_if_absent(&self, code: &str, target: &str) -> Result<ShortLink> {
        let mut table = self.table.write();
        let link = table.insert_if_absent(code, target)?;
        if let Err(e) = self.persist(&table) {
            table.discard(code);
            return Err(e);
        }
        Ok(link)
    }

    async fn get(&self, code: &str) -> Result<ShortLink> {
        self.table.read().get(code)
    }

    async fn replace(
        &self,
        code: &str,
        new_target: Option<&str>,
        new_code: Option<&str>,
    ) -> Result<ShortLink> {
        let mut table = self.table.write();
        let (updated, previous) = table.replace(code, new_target, new_code)?;
        if let Err(e) = self.persist(&table) {
            table.restore(&updated.code, previous);
            return Err(e);
        }
        Ok(updated)
    }

    async fn remove(&self, code: &str) -> Result<ShortLink> {
        let mut table = self.table.write();
        let removed = table.remove(code)?;
        if let Err(e) = self.persist(&table) {
            table.reinsert(removed);
            return Err(e);
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().len())
    }

    fn backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: "file".to_string(),
            persistent: true,
        }
    }

    fn as_click_sink(self: Arc<Self>) -> Arc<dyn ClickSink> {
        self
    }
}

#[async_trait]
impl ClickSink for FileStore {
    async fn flush_clicks(&self, updates: Vec<(LinkId, u64)>) -> anyhow::Result<()> {
        let mut table = self.table.write();
        let previous = table.apply_clicks(&updates);
        if previous.is_empty() {
            debug!("FileStore: no live links in click batch, nothing to persist");
            return Ok(());
        }

        if let Err(e) = self.persist(&table) {
            table.reset_clicks(&previous);
            return Err(anyhow::anyhow!("Failed to persist click counts: {}", e));
        }

        debug!(
            "Click counts flushed to {} ({} links)",
            self.file_path.display(),
            previous.len()
        );
        Ok(())
    }

    async fn click_count(&self, code: &str) -> Result<(LinkId, u64)> {
        self.table.read().count_for(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_failed_write_rolls_back_insert() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let store = FileStore::open(data_dir.join("links.json")).unwrap();

        // 把数据目录替换成普通文件，之后的写入都会失败
        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"not a directory").unwrap();

        let err = store
            .insert_if_absent("abc", "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::StorageUnavailable(_)));
        assert!(matches!(
            store.get("abc").await,
            Err(ShortenerError::NotFound(_))
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_remove_and_move() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let store = FileStore::open(data_dir.join("links.json")).unwrap();
        store
            .insert_if_absent("keep", "https://example.com")
            .await
            .unwrap();

        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"not a directory").unwrap();

        assert!(store.remove("keep").await.is_err());
        assert!(store.replace("keep", None, Some("moved")).await.is_err());

        assert_eq!(store.get("keep").await.unwrap().target, "https://example.com");
        assert!(store.get("moved").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_click_flush_restores_counts() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let store = FileStore::open(data_dir.join("links.json")).unwrap();
        let link = store
            .insert_if_absent("hot", "https://example.com")
            .await
            .unwrap();

        fs::remove_dir_all(&data_dir).unwrap();
        fs::write(&data_dir, b"not a directory").unwrap();

        assert!(store.flush_clicks(vec![(link.id, 5)]).await.is_err());
        assert_eq!(store.click_count("hot").await.unwrap(), (link.id, 0));
    }
}
