//! # JSON-RPC 2.0 Message Engine
//!
//! A transport-agnostic JSON-RPC 2.0 engine. Raw request text goes in, raw response
//! text comes out; sockets, listeners and content negotiation belong to the transport.
//!
//! ## Features
//! - Envelope validation with the standard error taxonomy
//! - Named methods backed by ordered handler pipelines
//! - Concurrent batch execution with input-ordered output
//! - Per-request isolation: a panicking handler only fails its own slot
//! - Typed results encoded with exact JSON literal rules
//!
//! ```rust,no_run
//! use jsonrpc_engine::prelude::*;
//!
//! # async fn run() -> Result<(), EngineError> {
//! let engine = Engine::builder()
//!     .register("ping", |ctx: &mut Context| ctx.set_string("pong"))
//!     .build();
//!
//! let reply = engine
//!     .dispatch(r#"{"jsonrpc": "2.0", "method": "ping", "id": 1}"#)
//!     .await?;
//! assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":"pong","id":1}"#));
//! # Ok(())
//! # }
//! ```

pub mod bind;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod result;
pub mod types;

// Re-export main types
pub use bind::{BindError, Validate};
pub use context::{Context, Extensions};
pub use dispatch::Reply;
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::{ContextError, EngineError, ErrorCode, ErrorObject, RpcError};
pub use registry::{MethodHandler, MethodRegistry, Pipeline};
pub use request::{Envelope, EnvelopeError};
pub use response::{Outcome, Response, SERVER_ERROR_BODY};
pub use result::{ResultError, ResultKind, ResultValue};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const SERVER_ERROR: i64 = -32000;

    // Reserved for the protocol: -32768 to -32000
    pub const RESERVED_START: i64 = -32768;
    pub const RESERVED_END: i64 = -32000;
}
