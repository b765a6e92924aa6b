//! Service layer for business logic
//!
//! Shared by the HTTP handlers and the tests; nothing here depends on
//! actix-web.

mod code_generator;
mod link_service;

pub use code_generator::CodeGenerator;
pub use link_service::LinkService;
