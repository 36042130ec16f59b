//! Single versus batch dispatch.
//!
//! Every request, batched or not, runs in its own tokio task so a panicking handler
//! only costs its own slot. Batch slots are allocated before any task is spawned and
//! are read back by index, never by completion order.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::context::{Context, Extensions};
use crate::engine::EngineState;
use crate::error::RpcError;
use crate::request::{Envelope, request_id_hint};
use crate::response::{Response, render_batch};
use crate::types::RequestId;

/// What the engine has to say back for one payload
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
    /// Every request was a notification that succeeded; nothing goes on the wire.
    Nothing,
}

impl Reply {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Reply::Nothing)
    }

    /// Render to wire text; `None` for [`Reply::Nothing`].
    pub fn render(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            Reply::Single(response) => response.to_json_string().map(Some),
            Reply::Batch(responses) => render_batch(responses).map(Some),
            Reply::Nothing => Ok(None),
        }
    }
}

impl From<Option<Response>> for Reply {
    fn from(response: Option<Response>) -> Self {
        response.map_or(Reply::Nothing, Reply::Single)
    }
}

struct Slot {
    id_hint: Option<RequestId>,
    response: Option<Response>,
}

pub(crate) async fn dispatch_value(
    state: Arc<EngineState>,
    value: Value,
    extensions: Extensions,
) -> Reply {
    match value {
        Value::Array(items) => dispatch_batch(state, items, extensions).await,
        value @ Value::Object(_) => dispatch_single(state, value, extensions).await.into(),
        other => {
            warn!(kind = value_kind(&other), "payload is neither an object nor an array");
            Reply::Single(Response::error(None, RpcError::invalid_request()))
        }
    }
}

async fn dispatch_single(
    state: Arc<EngineState>,
    value: Value,
    extensions: Extensions,
) -> Option<Response> {
    let id_hint = request_id_hint(&value);
    let joined = tokio::spawn(handle_request(state, value, extensions)).await;
    joined.unwrap_or_else(|err| Some(task_failure(id_hint, 0, err)))
}

async fn dispatch_batch(
    state: Arc<EngineState>,
    items: Vec<Value>,
    extensions: Extensions,
) -> Reply {
    if items.is_empty() {
        debug!("empty batch rejected");
        return Reply::Single(Response::error(None, RpcError::invalid_request()));
    }
    if items.len() > state.config.max_batch_size {
        warn!(
            size = items.len(),
            limit = state.config.max_batch_size,
            "batch exceeds size limit"
        );
        return Reply::Single(Response::error(None, RpcError::invalid_request()));
    }

    let mut slots: Vec<Slot> = items
        .iter()
        .map(|item| Slot {
            id_hint: request_id_hint(item),
            response: None,
        })
        .collect();

    debug!(size = slots.len(), "dispatching batch");
    let handles: Vec<_> = items
        .into_iter()
        .map(|item| tokio::spawn(handle_request(Arc::clone(&state), item, extensions.clone())))
        .collect();

    for (index, (slot, joined)) in slots.iter_mut().zip(join_all(handles).await).enumerate() {
        slot.response = match joined {
            Ok(response) => response,
            Err(err) => Some(task_failure(slot.id_hint.clone(), index, err)),
        };
    }

    let responses: Vec<Response> = slots.into_iter().filter_map(|slot| slot.response).collect();
    if responses.is_empty() {
        Reply::Nothing
    } else {
        Reply::Batch(responses)
    }
}

/// Full per-request dispatch: validate, look up, run the pipeline.
///
/// Returns `None` when the request is a successful notification and the engine is
/// configured to suppress those.
async fn handle_request(
    state: Arc<EngineState>,
    value: Value,
    extensions: Extensions,
) -> Option<Response> {
    let id_hint = request_id_hint(&value);
    let envelope = match Envelope::try_from(value) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(reason = %err, "invalid request envelope");
            return Some(Response::error(id_hint, RpcError::invalid_request()));
        }
    };

    let Some(pipeline) = state.registry.lookup(&envelope.method) else {
        debug!(method = %envelope.method, "method not found");
        return Some(Response::error(envelope.id, RpcError::method_not_found()));
    };

    let notification = envelope.is_notification();
    let ctx = Context::new(envelope, extensions);
    debug!(method = ctx.method(), id = ?ctx.id(), "dispatching request");

    let ctx = match state.config.request_timeout {
        Some(limit) => {
            let mut fallback = ctx.detached();
            match tokio::time::timeout(limit, pipeline.run(ctx)).await {
                Ok(ctx) => ctx,
                Err(_) => {
                    error!(method = fallback.method(), ?limit, "handler pipeline timed out");
                    fallback.set_error(RpcError::internal_error());
                    fallback
                }
            }
        }
        None => pipeline.run(ctx).await,
    };

    let response = ctx.into_response();
    if notification && !response.is_error() && state.config.suppress_notification_responses {
        return None;
    }
    Some(response)
}

fn task_failure(id_hint: Option<RequestId>, index: usize, err: JoinError) -> Response {
    if err.is_panic() {
        error!(slot = index, id = ?id_hint, "handler panicked");
    } else {
        error!(slot = index, id = ?id_hint, error = %err, "request task failed");
    }
    Response::error(id_hint, RpcError::internal_error())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::registry::MethodRegistry;
    use serde_json::json;

    fn state(config: EngineConfig) -> Arc<EngineState> {
        let mut registry = MethodRegistry::new();
        registry.register("echo", |ctx: &mut Context| {
            let params = ctx.params().cloned().unwrap_or(Value::Null);
            if ctx.set_array(&params).is_err() {
                ctx.set_string(params.to_string());
            }
        });
        registry.register("boom", |ctx: &mut Context| {
            if ctx.method() == "boom" {
                panic!("handler exploded");
            }
        });
        Arc::new(EngineState { registry, config })
    }

    #[tokio::test]
    async fn test_scalar_payload_is_invalid_request() {
        let state = state(EngineConfig::default());
        let reply = dispatch_value(state, json!(42), Extensions::new()).await;
        let Reply::Single(response) = reply else {
            panic!("expected single reply");
        };
        assert_eq!(response.error_value().map(RpcError::code), Some(-32600));
        assert!(response.id().is_none());
    }

    #[tokio::test]
    async fn test_empty_batch_is_invalid_request() {
        let state = state(EngineConfig::default());
        let reply = dispatch_value(state, json!([]), Extensions::new()).await;
        assert!(matches!(reply, Reply::Single(ref r) if r.is_error()));
    }

    #[tokio::test]
    async fn test_batch_over_limit() {
        let config = EngineConfig {
            max_batch_size: 2,
            ..Default::default()
        };
        let batch = json!([
            {"jsonrpc": "2.0", "method": "echo", "id": 1},
            {"jsonrpc": "2.0", "method": "echo", "id": 2},
            {"jsonrpc": "2.0", "method": "echo", "id": 3}
        ]);
        let reply = dispatch_value(state(config), batch, Extensions::new()).await;
        assert!(matches!(reply, Reply::Single(ref r) if r.is_error()));
    }

    #[tokio::test]
    async fn test_panic_fills_slot_with_internal_error() {
        let batch = json!([
            {"jsonrpc": "2.0", "method": "boom", "id": "first"},
            {"jsonrpc": "2.0", "method": "echo", "params": [1], "id": "second"}
        ]);
        let reply = dispatch_value(state(EngineConfig::default()), batch, Extensions::new()).await;
        let Reply::Batch(responses) = reply else {
            panic!("expected batch reply");
        };
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id(), Some(&RequestId::from("first")));
        assert_eq!(responses[0].error_value().map(RpcError::code), Some(-32603));
        assert_eq!(responses[1].id(), Some(&RequestId::from("second")));
        assert!(!responses[1].is_error());
    }

    #[tokio::test]
    async fn test_all_notifications_produce_nothing() {
        let batch = json!([
            {"jsonrpc": "2.0", "method": "echo"},
            {"jsonrpc": "2.0", "method": "echo", "params": [2]}
        ]);
        let reply = dispatch_value(state(EngineConfig::default()), batch, Extensions::new()).await;
        assert!(reply.is_nothing());
        assert_eq!(reply.render().unwrap(), None);
    }

    #[tokio::test]
    async fn test_notifications_kept_when_not_suppressed() {
        let config = EngineConfig {
            suppress_notification_responses: false,
            ..Default::default()
        };
        let request = json!({"jsonrpc": "2.0", "method": "echo", "params": [2]});
        let reply = dispatch_value(state(config), request, Extensions::new()).await;
        let rendered = reply.render().unwrap().unwrap();
        assert_eq!(rendered, r#"{"jsonrpc":"2.0","result":[2],"id":null}"#);
    }
}
