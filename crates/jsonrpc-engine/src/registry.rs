use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::context::Context;
use crate::error::RpcError;

/// Trait for handling a JSON-RPC method call.
///
/// Handlers answer through the [`Context`] setters instead of a return value, so a
/// pipeline of several handlers can share one request. Plain closures taking
/// `&mut Context` implement this trait and run on tokio's blocking pool; implement it
/// directly when the handler needs to await.
#[async_trait]
pub trait MethodHandler: Send + Sync + 'static {
    async fn handle(&self, ctx: &mut Context);

    /// Run the handler on an owned context and hand it back.
    async fn call(self: Arc<Self>, mut ctx: Context) -> Context {
        self.handle(&mut ctx).await;
        ctx
    }
}

#[async_trait]
impl<F> MethodHandler for F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut Context) {
        (self)(ctx)
    }

    /// Synchronous handlers may block, so they never run on an async worker.
    async fn call(self: Arc<Self>, ctx: Context) -> Context {
        let fallback = ctx.detached();
        let handler = self;
        let joined = tokio::task::spawn_blocking(move || {
            let mut ctx = ctx;
            (*handler)(&mut ctx);
            ctx
        })
        .await;

        match joined {
            Ok(ctx) => ctx,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                error!(method = fallback.method(), error = %err, "blocking handler cancelled");
                let mut ctx = fallback;
                ctx.set_error(RpcError::internal_error());
                ctx
            }
        }
    }
}

/// Ordered, non-empty list of handlers registered under one method name.
///
/// Handlers run in registration order and the pipeline stops after a handler leaves
/// an error on the context. Results may be overwritten by later handlers.
#[derive(Clone)]
pub struct Pipeline {
    handlers: Vec<Arc<dyn MethodHandler>>,
}

impl Pipeline {
    pub fn new<H>(handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        Self {
            handlers: vec![Arc::new(handler)],
        }
    }

    /// Append a handler to run after the current ones.
    pub fn then<H>(mut self, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Build from an already-collected list; `None` when the list is empty.
    pub fn from_handlers(handlers: Vec<Arc<dyn MethodHandler>>) -> Option<Self> {
        if handlers.is_empty() {
            None
        } else {
            Some(Self { handlers })
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) async fn run(&self, mut ctx: Context) -> Context {
        for (index, handler) in self.handlers.iter().enumerate() {
            ctx = Arc::clone(handler).call(ctx).await;
            if ctx.has_error() {
                if index + 1 < self.handlers.len() {
                    debug!(
                        method = ctx.method(),
                        stage = index,
                        "pipeline stopped after handler error"
                    );
                }
                break;
            }
        }
        ctx
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Method name to handler pipeline mapping
#[derive(Debug, Default, Clone)]
pub struct MethodRegistry {
    methods: HashMap<String, Pipeline>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single handler for a method
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: MethodHandler + 'static,
    {
        self.register_pipeline(name, Pipeline::new(handler));
    }

    /// Register a pipeline for a method, replacing any earlier registration
    pub fn register_pipeline(&mut self, name: impl Into<String>, pipeline: Pipeline) {
        let name = name.into();
        let stages = pipeline.len();
        if self.methods.insert(name.clone(), pipeline).is_some() {
            debug!(method = %name, stages, "replaced existing method registration");
        } else {
            debug!(method = %name, stages, "registered method");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Pipeline> {
        self.methods.get(name)
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
