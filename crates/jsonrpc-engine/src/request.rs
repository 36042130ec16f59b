use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{JsonRpcVersion, RequestId};

/// Why a parsed value was not accepted as a request envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("jsonrpc member must be exactly \"2.0\"")]
    BadVersion,

    #[error("method member is missing")]
    MissingMethod,

    #[error("method member must be a string")]
    MethodNotString,

    #[error("method member must not be empty")]
    EmptyMethod,

    #[error("id member must be a string or an integer")]
    BadId,
}

/// A validated JSON-RPC request: the protocol fields with params left undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub method: String,
    pub id: Option<RequestId>,
    pub params: Option<Value>,
}

impl Envelope {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

impl TryFrom<Value> for Envelope {
    type Error = EnvelopeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(obj) = value else {
            return Err(EnvelopeError::NotAnObject);
        };
        validate_envelope(obj)
    }
}

fn validate_envelope(mut obj: Map<String, Value>) -> Result<Envelope, EnvelopeError> {
    match obj.get("jsonrpc") {
        Some(version) if JsonRpcVersion::matches(version) => {}
        _ => return Err(EnvelopeError::BadVersion),
    }

    let method = match obj.remove("method") {
        None => return Err(EnvelopeError::MissingMethod),
        Some(Value::String(method)) if method.is_empty() => {
            return Err(EnvelopeError::EmptyMethod);
        }
        Some(Value::String(method)) => method,
        Some(_) => return Err(EnvelopeError::MethodNotString),
    };

    let id = match obj.get("id") {
        None => None,
        Some(raw) => Some(RequestId::from_value(raw).ok_or(EnvelopeError::BadId)?),
    };

    Ok(Envelope {
        method,
        id,
        params: obj.remove("params"),
    })
}

/// Best-effort id of a request that may not validate, used to label its error response.
pub fn request_id_hint(value: &Value) -> Option<RequestId> {
    value.get("id").and_then(RequestId::from_value)
}
