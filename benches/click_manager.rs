//! ClickManager 性能基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shortener::analytics::{ClickManager, ClickSink};
use shortener::errors::{Result, ShortenerError};
use shortener::storage::LinkId;
use std::hint::black_box;
use std::sync::Arc;
use tokio::time::Duration;

/// 空 sink，只用于测试 increment 性能
struct NoopSink;

#[async_trait::async_trait]
impl ClickSink for NoopSink {
    async fn flush_clicks(&self, _updates: Vec<(LinkId, u64)>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn click_count(&self, code: &str) -> Result<(LinkId, u64)> {
        Err(ShortenerError::not_found(code))
    }
}

fn create_manager() -> ClickManager {
    ClickManager::new(
        Arc::new(NoopSink) as Arc<dyn ClickSink>,
        Duration::from_secs(3600), // 长间隔，避免自动刷盘
        u64::MAX,                  // 高阈值，避免阈值刷盘
    )
}

fn bench_increment_single_thread(c: &mut Criterion) {
    let manager = create_manager();

    c.bench_function("increment/single_link", |b| {
        b.iter(|| {
            manager.increment(black_box(LinkId(1)));
        });
    });
}

fn bench_increment_different_links(c: &mut Criterion) {
    let manager = create_manager();
    let mut idx = 0u64;

    c.bench_function("increment/different_links", |b| {
        b.iter(|| {
            manager.increment(black_box(LinkId(idx % 1000)));
            idx += 1;
        });
    });
}

/// 多任务并发写同一个热点链接
fn bench_concurrent_increment(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("increment/concurrent");

    for num_tasks in [2u64, 4, 8, 16] {
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::new("tasks", num_tasks),
            &num_tasks,
            |b, &num_tasks| {
                b.to_async(&rt).iter(|| async {
                    let manager = Arc::new(create_manager());
                    let mut handles = vec![];

                    for _ in 0..num_tasks {
                        let mgr = Arc::clone(&manager);
                        handles.push(tokio::spawn(async move {
                            for _ in 0..1000 / num_tasks {
                                mgr.increment(LinkId(7));
                            }
                        }));
                    }

                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// 预填充后 flush
fn bench_flush(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("flush");

    for num_links in [100u64, 1000, 10000] {
        group.throughput(Throughput::Elements(num_links));
        group.bench_with_input(
            BenchmarkId::new("links", num_links),
            &num_links,
            |b, &num_links| {
                b.iter_batched(
                    || {
                        let manager = create_manager();
                        for i in 0..num_links {
                            manager.increment(LinkId(i));
                        }
                        manager
                    },
                    |manager| rt.block_on(manager.flush()),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_increment_single_thread,
    bench_increment_different_links,
    bench_concurrent_increment,
    bench_flush,
);
criterion_main!(benches);
