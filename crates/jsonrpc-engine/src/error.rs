use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::error_codes;

/// Standard JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::ParseError,
        ErrorCode::InvalidRequest,
        ErrorCode::MethodNotFound,
        ErrorCode::InvalidParams,
        ErrorCode::InternalError,
        ErrorCode::ServerError,
    ];

    pub const fn code(&self) -> i64 {
        match self {
            ErrorCode::ParseError => error_codes::PARSE_ERROR,
            ErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            ErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            ErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            ErrorCode::ServerError => error_codes::SERVER_ERROR,
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ServerError => "Server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// A protocol-level or application-level JSON-RPC error.
///
/// Standard errors carry only their catalog entry; the code and message are fixed.
/// Custom errors carry whatever the handler supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcError {
    Standard(ErrorCode),
    Custom {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

impl RpcError {
    pub const fn parse_error() -> Self {
        RpcError::Standard(ErrorCode::ParseError)
    }

    pub const fn invalid_request() -> Self {
        RpcError::Standard(ErrorCode::InvalidRequest)
    }

    pub const fn method_not_found() -> Self {
        RpcError::Standard(ErrorCode::MethodNotFound)
    }

    pub const fn invalid_params() -> Self {
        RpcError::Standard(ErrorCode::InvalidParams)
    }

    pub const fn internal_error() -> Self {
        RpcError::Standard(ErrorCode::InternalError)
    }

    pub const fn server_error() -> Self {
        RpcError::Standard(ErrorCode::ServerError)
    }

    /// Application error with a caller-chosen code.
    ///
    /// Codes inside the reserved range are accepted but logged, since clients will read
    /// them as protocol errors.
    pub fn custom(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if is_reserved_code(code) {
            warn!(
                code,
                message = %message,
                "custom error code falls in the reserved JSON-RPC range {}..={}",
                error_codes::RESERVED_START,
                error_codes::RESERVED_END
            );
        }
        RpcError::Custom {
            code,
            message,
            data: None,
        }
    }

    /// Attach a `data` member. Standard errors are promoted to custom ones carrying the
    /// same code and message.
    pub fn with_data(self, data: Value) -> Self {
        match self {
            RpcError::Standard(code) => RpcError::Custom {
                code: code.code(),
                message: code.message().to_string(),
                data: Some(data),
            },
            RpcError::Custom { code, message, .. } => RpcError::Custom {
                code,
                message,
                data: Some(data),
            },
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            RpcError::Standard(code) => code.code(),
            RpcError::Custom { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RpcError::Standard(code) => code.message(),
            RpcError::Custom { message, .. } => message,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            RpcError::Standard(_) => None,
            RpcError::Custom { data, .. } => data.as_ref(),
        }
    }

    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code(),
            message: self.message().to_string(),
            data: self.data().cloned(),
        }
    }
}

impl From<ErrorCode> for RpcError {
    fn from(code: ErrorCode) -> Self {
        RpcError::Standard(code)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code(), self.message())
    }
}

impl std::error::Error for RpcError {}

/// True for codes inside `-32768..=-32000`.
pub fn is_reserved_code(code: i64) -> bool {
    (error_codes::RESERVED_START..=error_codes::RESERVED_END).contains(&code)
}

/// JSON-RPC error object as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Failures of the engine itself, outside any single request's protocol handling
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Response serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Conditions a handler may observe while reading its request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("request carried no params")]
    ParamsAbsent,
}
