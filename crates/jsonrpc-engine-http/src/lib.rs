//! # HTTP JSON-RPC Server
//!
//! HTTP/1.1 transport for [`jsonrpc_engine`]. The adapter reads the whole request body,
//! hands the text to the engine and writes the engine's reply back as
//! `application/json`. It owns the listener and connection lifecycle; the engine owns
//! the protocol.
//!
//! ## Behaviour
//! - `POST` to the configured path dispatches the body
//! - A body that cannot be read (or exceeds the size limit) gets the fixed
//!   `Server error` reply without reaching the engine
//! - Replies to notification-only payloads are `204 No Content`
//! - Request headers are visible to handlers under [`HEADERS_KEY`]

pub mod handler;
pub mod server;

// Re-export main types
pub use handler::{HEADERS_KEY, RpcHttpHandler};
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use jsonrpc_engine::{Engine, EngineBuilder};

/// Result type for HTTP JSON-RPC operations
pub type Result<T> = std::result::Result<T, HttpRpcError>;

/// HTTP transport errors
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
