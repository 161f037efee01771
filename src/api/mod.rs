//! API Layer Module
//!
//! HTTP server, routes, and WebSocket wiring for the poolforge backend.

pub mod routes;
pub mod server;

// Re-exports for convenience
pub use routes::create_router;
pub use server::{start_server, AppState, SharedAppState};
