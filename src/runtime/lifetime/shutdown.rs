use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::analytics::ClickManager;

/// 点击计数刷盘超时时间（秒）
const FLUSH_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C 信号
pub async fn listen_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, flushing data...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// 将缓冲的点击计数写入存储
pub async fn flush_clicks(manager: Option<&ClickManager>) {
    let Some(manager) = manager else {
        info!("Click tracking is disabled, skipping flush");
        return;
    };

    match timeout(Duration::from_secs(FLUSH_TIMEOUT_SECS), manager.flush()).await {
        Ok(()) if manager.buffer_size() == 0 => {
            info!("ClickManager flushed successfully");
        }
        Ok(()) => {
            error!(
                "ClickManager flush left {} clicks unwritten",
                manager.buffer_size()
            );
        }
        Err(_) => {
            error!(
                "ClickManager flush timed out after {} seconds",
                FLUSH_TIMEOUT_SECS
            );
        }
    }
}
