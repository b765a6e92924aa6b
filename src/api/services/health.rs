use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use super::helpers::json_response;
use crate::api::types::HealthResponse;
use crate::services::LinkService;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        service: web::Data<LinkService>,
        app_start_time: web::Data<AppStartTime>,
    ) -> HttpResponse {
        let start_time = Instant::now();
        let storage = service.storage_config().storage_type;

        let (links_count, check_error) =
            match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, service.count()).await {
                Ok(Ok(count)) => (Some(count), None),
                Ok(Err(e)) => {
                    error!("Storage health check failed: {}", e);
                    (None, Some(e.to_string()))
                }
                Err(_) => {
                    error!("Storage health check timeout");
                    (None, Some("timeout".to_string()))
                }
            };

        let now = chrono::Utc::now();
        let uptime_secs = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = check_error.is_none();

        let body = HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            links_count,
            storage,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs,
            timestamp: now,
            error: check_error,
        };

        debug!(
            "Health check completed in {:?}, healthy: {}",
            start_time.elapsed(),
            is_healthy
        );

        let status = if is_healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_response(status, &body)
    }
}
