use prometheus::{Encoder, Gauge, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Application metrics container
///
/// One instance per server, shared through `web::Data`. Gauges are
/// refreshed when the endpoint is scraped; request counters are bumped by
/// the timing middleware.
pub struct Metrics {
    registry: Registry,

    // ===== HTTP =====
    /// Finished requests by method, route pattern and status
    pub http_requests_total: IntCounterVec,

    // ===== Links =====
    /// Live links in the store
    pub links_total: IntGauge,
    /// Clicks buffered and not yet written to the store
    pub clicks_buffer_size: IntGauge,

    // ===== System =====
    pub uptime_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "shortener_http_requests_total",
                "Total HTTP requests by method, route and status",
            ),
            &["method", "route", "status"],
        )?;
        let links_total = IntGauge::new("shortener_links_total", "Number of live short links")?;
        let clicks_buffer_size = IntGauge::new(
            "shortener_clicks_buffer_size",
            "Clicks buffered and not yet written to storage",
        )?;
        let uptime_seconds = Gauge::new("shortener_uptime_seconds", "Server uptime in seconds")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(links_total.clone()))?;
        registry.register(Box::new(clicks_buffer_size.clone()))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            links_total,
            clicks_buffer_size,
            uptime_seconds,
        })
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16) {
        self.http_requests_total
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_registered_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.links_total.set(3);
        metrics.record_request("GET", "/u/{code}", 302);
        metrics.record_request("GET", "/u/{code}", 302);

        let output = metrics.export().unwrap();
        assert!(output.contains("shortener_links_total 3"));
        assert!(output.contains("shortener_clicks_buffer_size 0"));
        assert!(output.contains("shortener_uptime_seconds"));
        assert!(output.contains(
            r#"shortener_http_requests_total{method="GET",route="/u/{code}",status="302"} 2"#
        ));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_request("POST", "/shorten", 201);

        assert!(a.export().unwrap().contains("shortener_http_requests_total"));
        // 没有任何样本的 CounterVec 不会导出
        assert!(!b.export().unwrap().contains("shortener_http_requests_total{"));
    }
}
