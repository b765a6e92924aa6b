//! In-memory link table shared by every backend
//!
//! Not synchronized on its own: backends wrap it in a lock and call these
//! methods with the lock held. Every mutating method either fully applies or
//! leaves the table untouched, and returns what is needed to undo it.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::models::{LinkId, ShortLink};
use crate::errors::{Result, ShortenerError};

#[derive(Debug, Default)]
pub(crate) struct LinkTable {
    links: HashMap<String, ShortLink>,
    codes_by_id: HashMap<LinkId, String>,
    next_id: u64,
}

/// 持久化快照格式
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct TableSnapshot {
    pub next_id: u64,
    pub links: Vec<ShortLink>,
}

impl LinkTable {
    pub fn from_snapshot(snapshot: TableSnapshot) -> Result<Self> {
        let mut table = LinkTable {
            next_id: snapshot.next_id,
            ..Default::default()
        };

        for link in snapshot.links {
            if table.links.contains_key(&link.code) {
                return Err(ShortenerError::storage_unavailable(format!(
                    "snapshot contains duplicate code '{}'",
                    link.code
                )));
            }
            if table.codes_by_id.contains_key(&link.id) {
                return Err(ShortenerError::storage_unavailable(format!(
                    "snapshot contains duplicate id {}",
                    link.id
                )));
            }
            table.next_id = table.next_id.max(link.id.0 + 1);
            table.put(link);
        }

        Ok(table)
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let mut links: Vec<ShortLink> = self.links.values().cloned().collect();
        links.sort_by_key(|l| l.id);
        TableSnapshot {
            next_id: self.next_id,
            links,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn get(&self, code: &str) -> Result<ShortLink> {
        self.links
            .get(code)
            .cloned()
            .ok_or_else(|| ShortenerError::not_found(format!("Short code '{}' not found", code)))
    }

    /// 持久化的点击数，连同链接 id 一起返回
    pub fn count_for(&self, code: &str) -> Result<(LinkId, u64)> {
        self.links
            .get(code)
            .map(|l| (l.id, l.access_count))
            .ok_or_else(|| ShortenerError::not_found(format!("Short code '{}' not found", code)))
    }

    pub fn insert_if_absent(&mut self, code: &str, target: &str) -> Result<ShortLink> {
        if self.links.contains_key(code) {
            return Err(ShortenerError::already_exists(format!(
                "Short code '{}' already exists",
                code
            )));
        }

        let now = Utc::now();
        let link = ShortLink {
            id: LinkId(self.next_id),
            code: code.to_string(),
            target: target.to_string(),
            created_at: now,
            updated_at: now,
            access_count: 0,
        };
        self.next_id += 1;
        self.put(link.clone());
        Ok(link)
    }

    /// Returns `(updated, previous)`.
    pub fn replace(
        &mut self,
        code: &str,
        new_target: Option<&str>,
        new_code: Option<&str>,
    ) -> Result<(ShortLink, ShortLink)> {
        let previous = self.get(code)?;

        let moving_to = new_code.filter(|c| *c != code);
        if let Some(dest) = moving_to
            && self.links.contains_key(dest)
        {
            return Err(ShortenerError::code_conflict(format!(
                "Short code '{}' is already taken",
                dest
            )));
        }

        let mut updated = previous.clone();
        if let Some(target) = new_target {
            updated.target = target.to_string();
        }
        if let Some(dest) = moving_to {
            updated.code = dest.to_string();
        }
        if new_target.is_some() || new_code.is_some() {
            updated.updated_at = Utc::now();
        }

        // 单个临界区内完成搬迁：先释放旧 key，再占用新 key
        self.take(code);
        self.put(updated.clone());

        Ok((updated, previous))
    }

    pub fn remove(&mut self, code: &str) -> Result<ShortLink> {
        self.take(code)
            .ok_or_else(|| ShortenerError::not_found(format!("Short code '{}' not found", code)))
    }

    /// Undo a replace: drop whatever lives under `current_code` and put the
    /// previous record back.
    pub fn restore(&mut self, current_code: &str, previous: ShortLink) {
        self.take(current_code);
        self.put(previous);
    }

    /// Undo an insert.
    pub fn discard(&mut self, code: &str) {
        self.take(code);
    }

    /// Undo a remove.
    pub fn reinsert(&mut self, link: ShortLink) {
        self.put(link);
    }

    /// Adds buffered clicks to live links. Ids that no longer exist are
    /// skipped. Returns the previous counts of the links that were touched.
    pub fn apply_clicks(&mut self, updates: &[(LinkId, u64)]) -> Vec<(LinkId, u64)> {
        let mut previous = Vec::with_capacity(updates.len());
        for (id, delta) in updates {
            let Some(code) = self.codes_by_id.get(id) else {
                continue;
            };
            if let Some(link) = self.links.get_mut(code) {
                previous.push((*id, link.access_count));
                link.access_count = link.access_count.saturating_add(*delta);
            }
        }
        previous
    }

    /// Undo `apply_clicks`.
    pub fn reset_clicks(&mut self, previous: &[(LinkId, u64)]) {
        for (id, count) in previous {
            if let Some(code) = self.codes_by_id.get(id)
                && let Some(link) = self.links.get_mut(code)
            {
                link.access_count = *count;
            }
        }
    }

    fn put(&mut self, link: ShortLink) {
        self.codes_by_id.insert(link.id, link.code.clone());
        self.links.insert(link.code.clone(), link);
    }

    fn take(&mut self, code: &str) -> Option<ShortLink> {
        let link = self.links.remove(code)?;
        self.codes_by_id.remove(&link.id);
        Some(link)
    }
}
