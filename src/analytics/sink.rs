use crate::errors::Result;
use crate::storage::LinkId;

/// 点击计数 Sink（聚合模式）
///
/// Implemented by the stores. Updates for ids that are no longer live are
/// dropped by the sink.
#[async_trait::async_trait]
pub trait ClickSink: Send + Sync {
    async fn flush_clicks(&self, updates: Vec<(LinkId, u64)>) -> anyhow::Result<()>;

    /// Persisted count of a live code, together with its link id.
    async fn click_count(&self, code: &str) -> Result<(LinkId, u64)>;
}
