//! Mapping store
//!
//! The store exclusively owns every [`ShortLink`]. Each operation on a code
//! runs inside one critical section, so concurrent callers observe them in
//! some sequential order.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::analytics::ClickSink;
use crate::config::{StorageBackend, StorageSettings};
use crate::errors::Result;

pub mod backends;
pub mod models;
mod table;

pub use backends::{FileStore, MemoryStore};
pub use models::{LinkId, ShortLink, StorageConfig};

#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Atomic test-and-set. Fails `AlreadyExists` if the code is live.
    async fn insert_if_absent(&self, code: &str, target: &str) -> Result<ShortLink>;

    /// Fails `NotFound` if the code is not live.
    async fn get(&self, code: &str) -> Result<ShortLink>;

    /// Changes the target and/or moves the record to `new_code`.
    ///
    /// A move claims the new code and releases the old one in the same
    /// critical section. Fails `NotFound` or `CodeConflict`.
    async fn replace(
        &self,
        code: &str,
        new_target: Option<&str>,
        new_code: Option<&str>,
    ) -> Result<ShortLink>;

    /// Removes the record together with its counter. Returns the removed
    /// record, or `NotFound`.
    async fn remove(&self, code: &str) -> Result<ShortLink>;

    /// 当前存活的链接数量
    async fn count(&self) -> Result<usize>;

    fn backend_config(&self) -> StorageConfig;

    fn as_click_sink(self: Arc<Self>) -> Arc<dyn ClickSink>;
}

pub struct StorageFactory;

impl StorageFactory {
    pub fn create(settings: &StorageSettings) -> Result<Arc<dyn MappingStore>> {
        let store: Arc<dyn MappingStore> = match settings.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(FileStore::open(&settings.file_path)?),
        };

        info!(
            "Using storage backend: {} (persistent: {})",
            settings.backend,
            store.backend_config().persistent
        );
        Ok(store)
    }
}
