//! 点击统计管理器
//!
//! 缓冲短链接的访问计数，批量写回存储：
//! - increment 不加全局锁（DashMap 分片）
//! - 后台定时写回
//! - 累计点击数达到阈值时提前写回
//!
//! Counts are keyed by [`LinkId`], not by code, so buffered clicks follow a
//! renamed link and never leak into a link re-created under a deleted code.

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::ClickSink;
use crate::errors::Result;
use crate::storage::LinkId;

/// 计数缓冲区，按 LinkId 聚合
struct ClickBuffer {
    data: DashMap<LinkId, u64>,
    /// 尚未写回的点击总数
    total_clicks: AtomicU64,
    /// 刷盘锁，防止并发刷盘；读取统计时也持有它
    flush_lock: Mutex<()>,
    /// 阈值触发的写回任务是否已经 spawn
    flush_pending: AtomicBool,
}

impl ClickBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            total_clicks: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn increment(&self, id: LinkId) -> u64 {
        // 先计总数再写 map：drain 只能减掉已经计入总数的点击
        let total = self.total_clicks.fetch_add(1, Ordering::AcqRel) + 1;
        *self.data.entry(id).or_insert(0) += 1;
        trace!("ClickBuffer: Incremented link {}", id);

        total
    }

    fn pending(&self, id: LinkId) -> u64 {
        self.data.get(&id).map(|v| *v).unwrap_or(0)
    }

    /// 取出快照中的全部计数
    fn drain(&self) -> Vec<(LinkId, u64)> {
        let keys: Vec<LinkId> = self.data.iter().map(|r| *r.key()).collect();

        // 快照之后新增的 key 留给下一轮
        let mut updates = Vec::with_capacity(keys.len());
        let mut drained = 0;
        for key in keys {
            if let Some((k, v)) = self.data.remove(&key) {
                drained += v;
                updates.push((k, v));
            }
        }

        if drained > 0 {
            self.total_clicks
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(drained))
                })
                .ok();
        }

        updates
    }

    /// 写回失败时把计数放回缓冲区
    fn restore(&self, updates: Vec<(LinkId, u64)>) {
        let mut restored = 0;
        for (k, v) in updates {
            *self.data.entry(k).or_insert(0) += v;
            restored += v;
        }
        self.total_clicks
            .fetch_add(restored, Ordering::Relaxed);
    }

    fn total(&self) -> u64 {
        self.total_clicks.load(Ordering::Relaxed)
    }
}

/// 点击管理器
///
/// Cheap to clone: every clone shares the same buffer and sink.
#[derive(Clone)]
pub struct ClickManager {
    buffer: Arc<ClickBuffer>,
    sink: Arc<dyn ClickSink>,
    flush_interval: Duration,
    /// 达到该点击数即提前写回
    max_clicks_before_flush: u64,
}

impl ClickManager {
    pub fn new(
        sink: Arc<dyn ClickSink>,
        flush_interval: Duration,
        max_clicks_before_flush: u64,
    ) -> Self {
        Self {
            buffer: Arc::new(ClickBuffer::new()),
            sink,
            flush_interval,
            max_clicks_before_flush: max_clicks_before_flush.max(1),
        }
    }

    /// 增加点击计数（无锁，不等待刷盘）
    ///
    /// Must be called from within a tokio runtime: reaching the threshold
    /// spawns a flush task.
    pub fn increment(&self, id: LinkId) {
        let pending = self.buffer.increment(id);
        trace!("Click buffered, {} pending", pending);

        if pending >= self.max_clicks_before_flush {
            // 只有成功将 flush_pending 从 false 设为 true 的调用者才 spawn
            if self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let buffer = Arc::clone(&self.buffer);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    if let Ok(_guard) = buffer.flush_lock.try_lock() {
                        Self::flush_buffer(&buffer, &sink).await;
                    } else {
                        trace!("Click flush already running");
                    }
                    buffer.flush_pending.store(false, Ordering::Release);
                });
            }
        }
    }

    /// Total clicks for a live code: persisted count plus buffered clicks.
    ///
    /// Holds the flush lock, so a concurrent flush cannot make a click
    /// appear twice or not at all.
    pub async fn read(&self, code: &str) -> Result<u64> {
        let _guard = self.buffer.flush_lock.lock().await;
        let (id, persisted) = self.sink.click_count(code).await?;
        Ok(persisted + self.buffer.pending(id))
    }

    /// Clicks for `id` still sitting in the buffer.
    ///
    /// Does not wait for a running flush, so the sum with a stored count
    /// read earlier may briefly miss clicks that are being written.
    pub fn pending(&self, id: LinkId) -> u64 {
        self.buffer.pending(id)
    }

    /// 启动后台刷盘任务，永不返回
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                trace!("Scheduled click flush");
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("Click flush already running, scheduled run skipped");
            }
        }
    }

    /// 立即写回并等待完成
    pub async fn flush(&self) {
        debug!("Flushing clicks on demand");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    async fn flush_buffer(buffer: &ClickBuffer, sink: &Arc<dyn ClickSink>) {
        let updates = buffer.drain();

        if updates.is_empty() {
            trace!("Click buffer empty, nothing to write");
            return;
        }

        let links = updates.len();
        match sink.flush_clicks(updates.clone()).await {
            Ok(_) => {
                debug!("Wrote clicks for {} links", links);
            }
            Err(e) => {
                buffer.restore(updates);
                warn!(
                    "Writing clicks failed: {}; {} links kept in the buffer",
                    e, links
                );
            }
        }
    }

    /// 当前缓冲区中尚未落盘的点击数
    pub fn buffer_size(&self) -> u64 {
        self.buffer.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use crate::errors::ShortenerError;

    struct RecordingSink {
        flushed: std::sync::Mutex<HashMap<LinkId, u64>>,
        codes: HashMap<String, LinkId>,
        fail: AtomicBool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self::with_codes(&[])
        }

        fn with_codes(codes: &[(&str, LinkId)]) -> Self {
            Self {
                flushed: std::sync::Mutex::new(HashMap::new()),
                codes: codes.iter().map(|(c, id)| (c.to_string(), *id)).collect(),
                fail: AtomicBool::new(false),
            }
        }

        fn get(&self, id: LinkId) -> u64 {
            self.flushed.lock().unwrap().get(&id).copied().unwrap_or(0)
        }

        fn total_clicks(&self) -> u64 {
            self.flushed.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl ClickSink for RecordingSink {
        async fn flush_clicks(&self, updates: Vec<(LinkId, u64)>) -> anyhow::Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("sink unavailable");
            }
            let mut flushed = self.flushed.lock().unwrap();
            for (id, n) in updates {
                *flushed.entry(id).or_insert(0) += n;
            }
            Ok(())
        }

        async fn click_count(&self, code: &str) -> Result<(LinkId, u64)> {
            let id = self
                .codes
                .get(code)
                .copied()
                .ok_or_else(|| ShortenerError::not_found(code.to_string()))?;
            Ok((id, self.get(id)))
        }
    }

    #[tokio::test]
    async fn test_increment_and_flush() {
        let sink = Arc::new(RecordingSink::new());
        let manager = ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(60),
            100,
        );

        manager.increment(LinkId(1));
        manager.increment(LinkId(1));
        manager.increment(LinkId(2));

        // 按点击数计，不是链接数
        assert_eq!(manager.buffer_size(), 3);

        manager.flush().await;

        assert_eq!(manager.buffer_size(), 0);
        assert_eq!(sink.get(LinkId(1)), 2);
        assert_eq!(sink.get(LinkId(2)), 1);
    }

    #[tokio::test]
    async fn test_read_combines_persisted_and_buffered() {
        let sink = Arc::new(RecordingSink::with_codes(&[("abc", LinkId(7))]));
        let manager = ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(60),
            100,
        );

        manager.increment(LinkId(7));
        manager.increment(LinkId(7));
        assert_eq!(manager.read("abc").await.unwrap(), 2);

        manager.flush().await;
        manager.increment(LinkId(7));
        assert_eq!(manager.read("abc").await.unwrap(), 3);

        assert!(matches!(
            manager.read("missing").await,
            Err(ShortenerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_flush_restores_buffer() {
        let sink = Arc::new(RecordingSink::new());
        let manager = ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(60),
            100,
        );

        sink.fail.store(true, Ordering::SeqCst);
        manager.increment(LinkId(1));
        manager.increment(LinkId(1));
        manager.flush().await;
        assert_eq!(manager.buffer_size(), 2);
        assert_eq!(sink.total_clicks(), 0);

        sink.fail.store(false, Ordering::SeqCst);
        manager.flush().await;
        assert_eq!(manager.buffer_size(), 0);
        assert_eq!(sink.get(LinkId(1)), 2);
    }

    #[tokio::test]
    async fn test_threshold_triggers_flush() {
        let sink = Arc::new(RecordingSink::new());
        let manager = ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(3600),
            5,
        );

        for _ in 0..5 {
            manager.increment(LinkId(3));
        }

        for _ in 0..50 {
            if sink.total_clicks() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.total_clicks(), 5);
        assert_eq!(manager.buffer_size(), 0);
    }

    /// 测试并发 increment 不会丢失点击
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increment() {
        let sink = Arc::new(RecordingSink::new());
        let manager = Arc::new(ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(60),
            100000,
        ));

        const NUM_TASKS: u64 = 10;
        const INCREMENTS_PER_TASK: u64 = 1000;

        let mut handles = vec![];
        for _ in 0..NUM_TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for _ in 0..INCREMENTS_PER_TASK {
                    mgr.increment(LinkId(42));
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(manager.buffer_size(), NUM_TASKS * INCREMENTS_PER_TASK);

        manager.flush().await;

        assert_eq!(sink.total_clicks(), NUM_TASKS * INCREMENTS_PER_TASK);
    }

    /// 测试并发 increment + drain 不会丢失数据
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increment_and_drain() {
        let sink = Arc::new(RecordingSink::new());
        let manager = Arc::new(ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(60),
            100000,
        ));

        const NUM_TASKS: u64 = 10;
        const INCREMENTS_PER_TASK: u64 = 1000;
        const NUM_FLUSHES: usize = 5;

        let mut handles = vec![];
        for _ in 0..NUM_TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for i in 0..INCREMENTS_PER_TASK {
                    mgr.increment(LinkId(i % 3));
                    if rand::random_range(0..100u8) < 4 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        let mgr_flush = Arc::clone(&manager);
        let flush_handle = tokio::spawn(async move {
            for _ in 0..NUM_FLUSHES {
                tokio::time::sleep(Duration::from_millis(5)).await;
                mgr_flush.flush().await;
            }
        });

        for handle in handles {
            handle.await.unwrap();
        }
        flush_handle.await.unwrap();

        manager.flush().await;

        assert_eq!(manager.buffer_size(), 0);
        assert_eq!(sink.total_clicks(), NUM_TASKS * INCREMENTS_PER_TASK);
    }

    /// 持续刷盘时 buffer_size 最终必须归零
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_buffer_size_settles_after_contended_drains() {
        let sink = Arc::new(RecordingSink::new());
        let manager = Arc::new(ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(3600),
            u64::MAX,
        ));

        const NUM_TASKS: u64 = 8;
        const INCREMENTS_PER_TASK: u64 = 5000;

        let stop = Arc::new(AtomicBool::new(false));
        let mgr_flush = Arc::clone(&manager);
        let stop_flag = Arc::clone(&stop);
        let flusher = tokio::spawn(async move {
            while !stop_flag.load(Ordering::Acquire) {
                mgr_flush.flush().await;
                tokio::task::yield_now().await;
            }
        });

        let mut handles = vec![];
        for t in 0..NUM_TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for i in 0..INCREMENTS_PER_TASK {
                    mgr.increment(LinkId(t * 7 + i % 5));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        stop.store(true, Ordering::Release);
        flusher.await.unwrap();

        manager.flush().await;
        assert_eq!(manager.buffer_size(), 0);
        assert_eq!(sink.total_clicks(), NUM_TASKS * INCREMENTS_PER_TASK);
    }

    #[tokio::test]
    async fn test_pending_does_not_touch_sink() {
        let sink = Arc::new(RecordingSink::new());
        let manager = ClickManager::new(
            Arc::clone(&sink) as Arc<dyn ClickSink>,
            Duration::from_secs(60),
            100,
        );

        manager.increment(LinkId(9));
        manager.increment(LinkId(9));
        assert_eq!(manager.pending(LinkId(9)), 2);
        assert_eq!(manager.pending(LinkId(10)), 0);

        manager.flush().await;
        assert_eq!(manager.pending(LinkId(9)), 0);
    }
}
