//! Engine entry point: parse, validate, dispatch, serialize.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::context::Extensions;
use crate::dispatch::{self, Reply};
use crate::error::{EngineError, RpcError};
use crate::registry::{MethodHandler, MethodRegistry, Pipeline};
use crate::response::Response;

/// Protocol knobs for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Drop responses to notifications that succeeded (errored ones are still answered)
    pub suppress_notification_responses: bool,
    /// Largest batch accepted; larger arrays are answered with one `InvalidRequest`
    pub max_batch_size: usize,
    /// Deadline for one request's handler pipeline; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suppress_notification_responses: true,
            max_batch_size: 1024,
            request_timeout: None,
        }
    }
}

/// Everything a dispatch task reads. Immutable once the engine is built.
#[derive(Debug)]
pub(crate) struct EngineState {
    pub(crate) registry: MethodRegistry,
    pub(crate) config: EngineConfig,
}

/// Builder for [`Engine`]; all registration happens here, before serving.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    registry: MethodRegistry,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single handler for a method
    pub fn register<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.registry.register(name, handler);
        self
    }

    /// Register an ordered handler pipeline for a method
    pub fn register_pipeline(mut self, name: impl Into<String>, pipeline: Pipeline) -> Self {
        self.registry.register_pipeline(name, pipeline);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn suppress_notification_responses(mut self, suppress: bool) -> Self {
        self.config.suppress_notification_responses = suppress;
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Engine {
        debug!(
            methods = self.registry.len(),
            suppress_notifications = self.config.suppress_notification_responses,
            "engine built"
        );
        Engine {
            state: Arc::new(EngineState {
                registry: self.registry,
                config: self.config,
            }),
        }
    }
}

/// Transport-agnostic JSON-RPC 2.0 engine. Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Engine {
    state: Arc<EngineState>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.state.config
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.state.registry.registered_methods()
    }

    /// Handle raw request text and return the raw reply.
    ///
    /// `Ok(None)` means there is nothing to write back (only successful notifications).
    pub async fn dispatch(&self, raw: &str) -> Result<Option<String>, EngineError> {
        self.dispatch_with(raw, Extensions::new()).await
    }

    /// Like [`Engine::dispatch`], seeding every request's context with `extensions`.
    pub async fn dispatch_with(
        &self,
        raw: &str,
        extensions: Extensions,
    ) -> Result<Option<String>, EngineError> {
        let reply = self.handle_raw(raw, extensions).await;
        Ok(reply.render()?)
    }

    /// Parse and dispatch without rendering.
    pub async fn handle_raw(&self, raw: &str, extensions: Extensions) -> Reply {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_value(value, extensions).await,
            Err(err) => {
                debug!(error = %err, "request body is not valid JSON");
                Reply::Single(Response::error(None, RpcError::parse_error()))
            }
        }
    }

    /// Dispatch an already-parsed payload.
    pub async fn handle_value(&self, value: Value, extensions: Extensions) -> Reply {
        dispatch::dispatch_value(Arc::clone(&self.state), value, extensions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert!(config.suppress_notification_responses);
        assert_eq!(config.max_batch_size, 1024);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let engine = Engine::builder()
            .register("ping", |ctx: &mut Context| ctx.set_string("pong"))
            .register("sum", |ctx: &mut Context| ctx.set_int(0))
            .max_batch_size(8)
            .suppress_notification_responses(false)
            .request_timeout(Duration::from_secs(5))
            .build();

        let mut methods = engine.registered_methods();
        methods.sort();
        assert_eq!(methods, vec!["ping".to_string(), "sum".to_string()]);
        assert_eq!(engine.config().max_batch_size, 8);
        assert!(!engine.config().suppress_notification_responses);
        assert_eq!(engine.config().request_timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let engine = Engine::builder().build();
        let reply = engine.dispatch("not json").await.unwrap();
        assert_eq!(
            reply.as_deref(),
            Some(r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}"#)
        );
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let engine = Engine::builder()
            .register("ping", |ctx: &mut Context| ctx.set_string("pong"))
            .build();
        let clone = engine.clone();
        let reply = clone
            .dispatch(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#)
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","result":"pong","id":1}"#));
    }
}
