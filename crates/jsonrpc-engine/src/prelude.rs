//! # JSON-RPC Engine Prelude
//!
//! Convenient re-exports of the types most handlers and transports need.
//!
//! ```rust
//! use jsonrpc_engine::prelude::*;
//! ```

pub use crate::bind::{BindError, Validate};
pub use crate::context::{Context, Extensions};
pub use crate::dispatch::Reply;
pub use crate::engine::{Engine, EngineBuilder, EngineConfig};
pub use crate::error::{EngineError, ErrorCode, RpcError};
pub use crate::registry::{MethodHandler, Pipeline};
pub use crate::response::{Response, SERVER_ERROR_BODY};
pub use crate::result::{ResultError, ResultValue};
pub use crate::types::RequestId;

pub use async_trait::async_trait;

// Standard error codes
pub use crate::error_codes::*;
