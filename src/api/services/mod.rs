pub mod health;
pub mod helpers;
pub mod links;
pub mod metrics;
pub mod redirect;

pub use health::{AppStartTime, HealthService};
pub use helpers::{api_result, error_response, json_config, json_response};
pub use metrics::MetricsService;
pub use redirect::RedirectService;
