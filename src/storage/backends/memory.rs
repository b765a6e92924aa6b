use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::trace;

use crate::analytics::ClickSink;
use crate::errors::Result;
use crate::storage::models::{LinkId, ShortLink, StorageConfig};
use crate::storage::table::LinkTable;
use crate::storage::MappingStore;

/// 纯内存存储，进程退出即丢失
///
/// Used for development and as the in-memory fake in tests.
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<LinkTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn insert_if_absent(&self, code: &str, target: &str) -> Result<ShortLink> {
        self.table.write().insert_if_absent(code, target)
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
        let (updated, _) = self.table.write().replace(code, new_target, new_code)?;
        Ok(updated)
    }

    async fn remove(&self, code: &str) -> Result<ShortLink> {
        self.table.write().remove(code)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().len())
    }

    fn backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: "memory".to_string(),
            persistent: false,
        }
    }

    fn as_click_sink(self: Arc<Self>) -> Arc<dyn ClickSink> {
        self
    }
}

#[async_trait]
impl ClickSink for MemoryStore {
    async fn flush_clicks(&self, updates: Vec<(LinkId, u64)>) -> anyhow::Result<()> {
        let applied = self.table.write().apply_clicks(&updates).len();
        trace!(
            "MemoryStore: applied clicks for {} of {} links",
            applied,
            updates.len()
        );
        Ok(())
    }

    async fn click_count(&self, code: &str) -> Result<(LinkId, u64)> {
        self.table.read().count_for(code)
    }
}
