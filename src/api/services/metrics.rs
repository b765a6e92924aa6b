//! Prometheus metrics endpoint
//!
//! `GET /metrics`: refreshes the gauges, then exports every registered
//! metric in Prometheus text format.

use actix_web::{HttpResponse, web};
use tracing::error;

use super::AppStartTime;
use crate::metrics::Metrics;
use crate::services::LinkService;

pub struct MetricsService;

impl MetricsService {
    pub async fn metrics(
        service: web::Data<LinkService>,
        metrics: web::Data<Metrics>,
        app_start_time: web::Data<AppStartTime>,
    ) -> HttpResponse {
        let uptime = (chrono::Utc::now() - app_start_time.start_datetime)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0;
        metrics.uptime_seconds.set(uptime);

        match service.count().await {
            Ok(count) => metrics.links_total.set(count as i64),
            Err(e) => error!("Metrics: failed to read link count: {}", e),
        }

        let buffered = service.click_manager().map_or(0, |c| c.buffer_size());
        metrics.clicks_buffer_size.set(buffered as i64);

        match metrics.export() {
            Ok(output) => HttpResponse::Ok()
                .content_type("text/plain; version=0.0.4; charset=utf-8")
                .body(output),
            Err(e) => {
                error!("Metrics: export failed: {}", e);
                HttpResponse::InternalServerError()
                    .content_type("text/plain")
                    .body("Failed to export metrics")
            }
        }
    }
}
