//! System-level modules
//!
//! Process-wide concerns that sit outside the request path.

pub mod logging;

pub use logging::init_logging;
