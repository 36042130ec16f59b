use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::RpcError;
use crate::result::ResultValue;
use crate::types::{JsonRpcVersion, RequestId};

/// Fixed body a transport writes when it cannot read the payload at all.
pub const SERVER_ERROR_BODY: &str =
    r#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"Server error"},"id":null}"#;

/// What a request has been answered with so far.
///
/// Result and error are variants of one enum, so a response can never carry both.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Outcome {
    #[default]
    Unanswered,
    Result(ResultValue),
    Error(RpcError),
}

/// One reply to one request
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: Option<RequestId>,
    outcome: Outcome,
}

impl Response {
    pub fn new(id: Option<RequestId>) -> Self {
        Self {
            id,
            outcome: Outcome::Unanswered,
        }
    }

    pub fn success(id: Option<RequestId>, result: ResultValue) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn set_result(&mut self, result: ResultValue) {
        self.outcome = Outcome::Result(result);
    }

    pub fn set_error(&mut self, error: RpcError) {
        self.outcome = Outcome::Error(error);
    }

    pub fn result(&self) -> Option<&ResultValue> {
        match &self.outcome {
            Outcome::Result(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_value(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// Field order is part of the wire contract: jsonrpc, result|error, id.
impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Response", 3)?;
        state.serialize_field("jsonrpc", &JsonRpcVersion::V2_0)?;
        match &self.outcome {
            Outcome::Error(error) => state.serialize_field("error", &error.to_error_object())?,
            Outcome::Result(result) => state.serialize_field("result", result)?,
            Outcome::Unanswered => state.serialize_field("result", &())?,
        }
        state.serialize_field("id", &self.id)?;
        state.end()
    }
}

/// Render a batch in slot order.
pub fn render_batch(responses: &[Response]) -> Result<String, serde_json::Error> {
    serde_json::to_string(responses)
}
