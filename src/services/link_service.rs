//! Link management service
//!
//! Orchestrates the code generator, the mapping store and the click
//! manager behind create, update, delete, resolve and stats. HTTP handlers
//! receive it through `web::Data`; tests build it over a [`MemoryStore`].
//!
//! [`MemoryStore`]: crate::storage::MemoryStore

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::analytics::ClickManager;
use crate::config::ShortenerSettings;
use crate::errors::{Result, ShortenerError};
use crate::services::CodeGenerator;
use crate::storage::{MappingStore, ShortLink, StorageConfig};
use crate::utils::normalize_url;

/// Service for link management operations
pub struct LinkService {
    store: Arc<dyn MappingStore>,
    clicks: Option<ClickManager>,
    generator: CodeGenerator,
    base_url: String,
}

impl LinkService {
    /// `clicks` is `None` when click tracking is disabled: resolve then
    /// records nothing and stats report the stored count.
    pub fn new(
        store: Arc<dyn MappingStore>,
        clicks: Option<ClickManager>,
        settings: &ShortenerSettings,
    ) -> Self {
        Self {
            store,
            clicks,
            generator: CodeGenerator::from_settings(settings),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn check_url(&self, url: &str) -> Result<String> {
        normalize_url(url).map_err(|e| {
            warn!(url = %url, "LinkService: rejected target URL: {}", e);
            ShortenerError::invalid_url(e.to_string())
        })
    }

    fn check_code(&self, code: &str) -> Result<()> {
        CodeGenerator::validate(code).inspect_err(|e| {
            warn!(code = %code, "LinkService: rejected short code: {}", e.message());
        })
    }

    fn report(&self, op: &str, err: ShortenerError) -> ShortenerError {
        if let ShortenerError::StorageUnavailable(msg) = &err {
            error!("LinkService: {} failed, storage unavailable: {}", op, msg);
        }
        err
    }

    /// Adds the buffered clicks of a link already read from the store.
    ///
    /// Goes by id and never fails, so an update that has committed is
    /// reported as committed even if the code is gone by now.
    fn with_pending_clicks(&self, mut link: ShortLink) -> ShortLink {
        if let Some(clicks) = &self.clicks {
            link.access_count += clicks.pending(link.id);
        }
        link
    }

    // ============ Operations ============

    /// Create a new short link
    ///
    /// Without a custom code, random codes are tried until one is free, at
    /// most `max_generation_attempts` times. An empty custom code counts as
    /// absent.
    pub async fn create(&self, url: &str, custom_code: Option<&str>) -> Result<ShortLink> {
        let target = self.check_url(url)?;

        if let Some(code) = custom_code.filter(|c| !c.is_empty()) {
            self.check_code(code)?;
            let link = self
                .store
                .insert_if_absent(code, &target)
                .await
                .map_err(|e| self.report("create", e))?;
            info!(code = %link.code, target = %link.target, "Link created");
            return Ok(link);
        }

        for attempt in 1..=self.generator.max_attempts() {
            let code = self.generator.generate();
            match self.store.insert_if_absent(&code, &target).await {
                Ok(link) => {
                    info!(code = %link.code, target = %link.target, attempt, "Link created");
                    return Ok(link);
                }
                Err(ShortenerError::AlreadyExists(_)) => {
                    debug!(code = %code, attempt, "Generated code collided, retrying");
                }
                Err(e) => return Err(self.report("create", e)),
            }
        }

        error!(
            "LinkService: no free code after {} attempts",
            self.generator.max_attempts()
        );
        Err(ShortenerError::generation_exhausted(format!(
            "Could not find a free short code after {} attempts",
            self.generator.max_attempts()
        )))
    }

    /// Update the target and/or move the link to a new code
    ///
    /// With neither field set the link is returned unchanged.
    pub async fn update(
        &self,
        code: &str,
        new_url: Option<&str>,
        new_code: Option<&str>,
    ) -> Result<ShortLink> {
        let new_target = new_url.map(|u| self.check_url(u)).transpose()?;
        let new_code = new_code.filter(|c| !c.is_empty());
        if let Some(c) = new_code {
            self.check_code(c)?;
        }

        if new_target.is_none() && new_code.is_none() {
            return self.get_link(code).await;
        }

        let link = self
            .store
            .replace(code, new_target.as_deref(), new_code)
            .await
            .map_err(|e| self.report("update", e))?;

        if link.code != code {
            info!(from = %code, code = %link.code, target = %link.target, "Link moved");
        } else {
            info!(code = %link.code, target = %link.target, "Link updated");
        }
        Ok(self.with_pending_clicks(link))
    }

    /// Delete a link together with its counter
    pub async fn delete(&self, code: &str) -> Result<()> {
        let removed = self
            .store
            .remove(code)
            .await
            .map_err(|e| self.report("delete", e))?;
        info!(code = %removed.code, target = %removed.target, "Link deleted");
        Ok(())
    }

    /// Look up the target and record a click without waiting for it
    pub async fn resolve(&self, code: &str) -> Result<String> {
        let link = self
            .store
            .get(code)
            .await
            .map_err(|e| self.report("resolve", e))?;
        if let Some(clicks) = &self.clicks {
            clicks.increment(link.id);
        }
        debug!(code = %code, target = %link.target, "Link resolved");
        Ok(link.target)
    }

    /// Access count including clicks not yet flushed
    pub async fn stats(&self, code: &str) -> Result<u64> {
        let count = match &self.clicks {
            Some(clicks) => clicks.read(code).await,
            None => self.store.get(code).await.map(|l| l.access_count),
        };
        count.map_err(|e| self.report("stats", e))
    }

    /// Full record with the exact live count (waits for a running flush).
    pub async fn get_link(&self, code: &str) -> Result<ShortLink> {
        let mut link = self
            .store
            .get(code)
            .await
            .map_err(|e| self.report("get_link", e))?;
        if let Some(clicks) = &self.clicks {
            link.access_count = clicks
                .read(code)
                .await
                .map_err(|e| self.report("get_link", e))?;
        }
        Ok(link)
    }

    /// 当前存活的链接数量
    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/u/{}", self.base_url, code)
    }

    pub fn storage_config(&self) -> StorageConfig {
        self.store.backend_config()
    }

    pub fn click_manager(&self) -> Option<&ClickManager> {
        self.clicks.as_ref()
    }
}
