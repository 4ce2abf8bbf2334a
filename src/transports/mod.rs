//! Transport layer implementations for JSON-RPC servers.
//!
//! - **Axum**: HTTP transport via Axum web framework

#[cfg(feature = "axum")]
pub mod axum;

// Re-export Axum transport
#[cfg(feature = "axum")]
pub use self::axum::{JsonRpcRouter, JsonRpcRouterBuilder, create_rpc_router};
