//! HTTP transport
//!
//! Thin layer over [`LinkService`](crate::services::LinkService): handlers
//! parse the request, call one service operation and map the result.

pub mod middleware;
pub mod services;
pub mod types;

use actix_web::web;

use services::links::{delete_link, link_stats, shorten, update_link};
use services::{HealthService, MetricsService, RedirectService, json_config};

/// 注册所有路由
///
/// - POST /shorten
/// - GET/PUT/DELETE /u/{code}
/// - GET /stats/{code}
/// - GET /health
/// - GET /metrics
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/shorten", web::post().to(shorten))
        .service(
            web::resource("/u/{code}")
                .route(web::get().to(RedirectService::handle_redirect))
                .route(web::put().to(update_link))
                .route(web::delete().to(delete_link)),
        )
        .route("/stats/{code}", web::get().to(link_stats))
        .route("/health", web::get().to(HealthService::health_check))
        .route("/metrics", web::get().to(MetricsService::metrics));
}
