//! Simple Calculator JSON-RPC Example
//!
//! Registers a few arithmetic methods, including a two-stage pipeline, and feeds the
//! engine raw request text the way a transport would.

use jsonrpc_engine::prelude::*;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

impl Validate for Operands {
    fn validate(&self) -> Result<(), String> {
        if !self.a.is_finite() || !self.b.is_finite() {
            return Err("operands must be finite".to_string());
        }
        Ok(())
    }
}

fn add(ctx: &mut Context) {
    match ctx.bind::<Operands>() {
        Ok(Operands { a, b }) => ctx.set_float(a + b),
        Err(err) => ctx.set_error(err),
    }
}

fn divide(ctx: &mut Context) {
    match ctx.bind::<Operands>() {
        Ok(Operands { b, .. }) if b == 0.0 => {
            ctx.set_error(RpcError::custom(1001, "division by zero"))
        }
        Ok(Operands { a, b }) => ctx.set_float(a / b),
        Err(err) => ctx.set_error(err),
    }
}

/// First pipeline stage: remember the caller-supplied label for the next stage.
fn label(ctx: &mut Context) {
    let label = ctx
        .params()
        .ok()
        .and_then(|p| p.get("label"))
        .and_then(|l| l.as_str())
        .unwrap_or("result")
        .to_string();
    ctx.set("label", label);
}

fn labelled_add(ctx: &mut Context) {
    let Ok(Operands { a, b }) = ctx.bind::<Operands>() else {
        ctx.set_error(RpcError::invalid_params());
        return;
    };
    let label = ctx.value::<String>("label").cloned().unwrap_or_default();
    let mut body = serde_json::Map::new();
    body.insert(label, serde_json::Value::from(a + b));
    if let Err(err) = ctx.set_object(&body) {
        ctx.set_error(RpcError::custom(1002, err.to_string()));
    }
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Engine::builder()
        .register("add", add)
        .register("divide", divide)
        .register_pipeline("labelled_add", Pipeline::new(label).then(labelled_add))
        .build();

    let test_requests = [
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": 5, "b": 3}, "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "divide", "params": {"a": 10, "b": 0}, "id": 2}"#,
        r#"{"jsonrpc": "2.0", "method": "multiply", "params": {"a": 2, "b": 3}, "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": "invalid", "b": 5}, "id": 4}"#,
        r#"{"jsonrpc": "2.0", "method": "labelled_add",
            "params": {"a": 1, "b": 2, "label": "total"}, "id": "five"}"#,
        r#"[{"jsonrpc": "2.0", "method": "add", "params": {"a": 1, "b": 1}, "id": 6},
            {"jsonrpc": "2.0", "method": "add", "params": {"a": 1, "b": 1}},
            {"jsonrpc": "2.0", "method": "divide", "params": {"a": 9, "b": 3}, "id": 7}]"#,
    ];

    for request in test_requests {
        info!(%request, "dispatching");
        match engine.dispatch(request).await? {
            Some(reply) => println!("{}", reply),
            None => println!("(no reply: notification)"),
        }
    }

    Ok(())
}
