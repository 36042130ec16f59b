//! HTTP JSON-RPC server

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use jsonrpc_engine::Engine;

use crate::{Result, RpcHttpHandler};

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path accepting JSON-RPC POSTs
    pub rpc_path: String,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            rpc_path: "/rpc".to_string(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for [`HttpRpcServer`]
pub struct HttpRpcServerBuilder {
    config: ServerConfig,
    engine: Engine,
}

impl HttpRpcServerBuilder {
    pub fn new(engine: Engine) -> Self {
        Self {
            config: ServerConfig::default(),
            engine,
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> HttpRpcServer {
        HttpRpcServer {
            handler: RpcHttpHandler::new(Arc::new(self.config), self.engine),
        }
    }
}

/// HTTP/1.1 server feeding request bodies to an [`Engine`]
#[derive(Clone)]
pub struct HttpRpcServer {
    handler: RpcHttpHandler,
}

impl HttpRpcServer {
    pub fn builder(engine: Engine) -> HttpRpcServerBuilder {
        HttpRpcServerBuilder::new(engine)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.handler.config
    }

    pub fn handler(&self) -> &RpcHttpHandler {
        &self.handler
    }

    /// Bind the configured address and serve until the listener fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config().bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(
            "JSON-RPC server listening on {}",
            listener.local_addr()?
        );
        info!("JSON-RPC endpoint available at: {}", self.config().rpc_path);
        info!(
            "Registered methods: {:?}",
            self.handler.engine().registered_methods()
        );

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move {
                        Ok::<_, std::convert::Infallible>(handler.handle_request(req).await)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected: {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}
