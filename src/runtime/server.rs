//! Server mode
//!
//! Configures and starts the HTTP server, then waits for either the server
//! to stop or a shutdown signal. Buffered clicks are flushed in both cases.

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::{
    App, HttpServer,
    http::header::{self, HeaderName},
    middleware::{Compress, Condition, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::api::configure_routes;
use crate::api::middleware::{REQUEST_ID_HEADER, RequestIdMiddleware, TimingMiddleware};
use crate::api::services::AppStartTime;
use crate::config::{CorsConfig, RateLimitConfig, StaticConfig};
use crate::runtime::lifetime;

/// 安全响应头
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains",
        ))
        .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
}

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(cors_config: &CorsConfig) {
    if !cors_config.enabled {
        return;
    }

    if cors_config.allowed_origins.is_empty() {
        warn!("CORS enabled with an empty allowed_origins list: any origin is allowed");
    }
}

/// Build CORS middleware from configuration
pub fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .expose_headers(vec![HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(cors_config.max_age);

    let is_any_origin = cors_config.allowed_origins.is_empty()
        || cors_config.allowed_origins.iter().any(|o| o == "*");

    if is_any_origin {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// 按客户端 IP 限流，令牌桶参数来自配置
pub fn build_rate_limit_config(
    config: &RateLimitConfig,
) -> Result<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_request_ms = (1000 / config.requests_per_second.max(1)).max(1);
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_request_ms)
        .burst_size(config.effective_burst().max(1))
        .finish()
        .context("Invalid rate limit configuration")
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let link_service = web::Data::from(Arc::clone(&startup.link_service));
    let metrics = web::Data::from(Arc::clone(&startup.metrics));

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} worker threads for the server", cpu_count);

    let cors_config = config.cors.clone();
    validate_cors_config(&cors_config);

    let rate_limit_enabled = config.rate_limit.enabled;
    let rate_limit_config = build_rate_limit_config(&config.rate_limit)?;
    if rate_limit_enabled {
        info!(
            "Rate limiting enabled: {} req/s per IP, burst {}",
            config.rate_limit.requests_per_second,
            config.rate_limit.effective_burst()
        );
    }

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(
                rate_limit_enabled,
                Governor::new(&rate_limit_config),
            ))
            .wrap(Condition::new(
                cors_config.enabled,
                build_cors_middleware(&cors_config),
            ))
            .wrap(Compress::default())
            .wrap(security_headers())
            .wrap(TimingMiddleware) // 记录请求耗时
            .wrap(RequestIdMiddleware) // 最外层，为每个请求生成 request_id
            .app_data(link_service.clone())
            .app_data(metrics.clone())
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .configure(configure_routes)
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();
    warn!("Starting server at http://{}", bind_address);

    let result = tokio::select! {
        res = server => res.context("HTTP server error"),
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown requested");
            Ok(())
        }
    };

    if let Some(task) = &startup.flush_task {
        task.abort();
    }
    lifetime::shutdown::flush_clicks(startup.click_manager.as_ref()).await;

    result
}
