use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::analytics::ClickManager;
use crate::config::StaticConfig;
use crate::metrics::Metrics;
use crate::services::LinkService;
use crate::storage::{MappingStore, StorageFactory};

pub struct StartupContext {
    pub store: Arc<dyn MappingStore>,
    pub link_service: Arc<LinkService>,
    pub metrics: Arc<Metrics>,
    pub click_manager: Option<ClickManager>,
    /// 后台刷盘任务，关闭时 abort
    pub flush_task: Option<JoinHandle<()>>,
}

/// 准备服务器启动的上下文
///
/// Must run inside a tokio runtime: the click flush task is spawned here.
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let store = StorageFactory::create(&config.storage)
        .context("Failed to initialize storage backend")?;

    let links = store
        .count()
        .await
        .context("Failed to read link count from storage")?;
    info!("Storage ready with {} links", links);

    let (click_manager, flush_task) = if config.clicks.enabled {
        let manager = ClickManager::new(
            Arc::clone(&store).as_click_sink(),
            Duration::from_secs(config.clicks.flush_interval_secs),
            config.clicks.max_clicks_before_flush,
        );

        let background = manager.clone();
        let handle = tokio::spawn(async move {
            background.start_background_task().await;
        });

        info!(
            "Click tracking enabled: flush every {}s or every {} clicks",
            config.clicks.flush_interval_secs, config.clicks.max_clicks_before_flush
        );
        (Some(manager), Some(handle))
    } else {
        info!("Click tracking disabled");
        (None, None)
    };

    let link_service = Arc::new(LinkService::new(
        Arc::clone(&store),
        click_manager.clone(),
        &config.shortener,
    ));

    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        store,
        link_service,
        metrics,
        click_manager,
        flush_task,
    })
}
