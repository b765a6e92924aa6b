//! Application lifecycle
//!
//! - `lifetime::startup`: build the store, click manager and service
//! - `server`: run the HTTP server
//! - `lifetime::shutdown`: flush buffered clicks before exit

pub mod lifetime;
pub mod server;

pub use server::run_server;
