//! Shortener - URL shortener core service
//!
//! Short-code allocation and resolution: collision-free code generation
//! under concurrent writers, atomic updates and deletes, and hit counters
//! that stay off the redirect hot path.
//!
//! # Architecture
//! - `services`: code generator and the link service (create, update,
//!   delete, resolve, stats)
//! - `storage`: mapping store trait and its memory / file backends
//! - `analytics`: buffered click counting
//! - `api`: HTTP routes and middleware
//! - `config`: configuration loading
//! - `metrics`: Prometheus service metrics
//! - `runtime`: application lifecycle
//! - `system`: logging

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
