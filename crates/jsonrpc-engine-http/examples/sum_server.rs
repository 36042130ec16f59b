//! Sum server
//!
//! Serves a single `sum` method over HTTP.
//!
//! ```text
//! curl -s localhost:8000/rpc -d '{"jsonrpc":"2.0","method":"sum","params":{"x":2,"y":3},"id":1}'
//! ```

use jsonrpc_engine::prelude::*;
use jsonrpc_engine_http::{HttpRpcServer, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct Args {
    x: i64,
    y: i64,
}

impl Validate for Args {
    fn validate(&self) -> std::result::Result<(), String> {
        self.x
            .checked_add(self.y)
            .map(|_| ())
            .ok_or_else(|| "sum overflows a 64-bit integer".to_string())
    }
}

fn sum(ctx: &mut Context) {
    match ctx.bind::<Args>() {
        Ok(Args { x, y }) => {
            info!(x, y, "sum");
            ctx.set_int(x + y);
        }
        Err(err) => ctx.set_error(err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let engine = Engine::builder().register("sum", sum).build();

    HttpRpcServer::builder(engine).build().run().await
}
