//! 点击统计
//!
//! Resolve only records an increment in the [`ClickManager`] buffer. The
//! buffer is merged into the store by a background task, on a threshold,
//! or by an explicit [`ClickManager::flush`].

pub mod manager;
pub mod sink;

pub use manager::ClickManager;
pub use sink::ClickSink;
