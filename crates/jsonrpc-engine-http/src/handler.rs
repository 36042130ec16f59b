//! HTTP request handler for JSON-RPC payloads

use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full, Limited};
use tracing::{debug, error, warn};

use jsonrpc_engine::{Engine, Extensions, RpcError, SERVER_ERROR_BODY};

use crate::ServerConfig;

/// Context key under which handlers find the request's [`HeaderMap`].
pub const HEADERS_KEY: &str = "http.headers";

/// Routes HTTP requests into the engine
#[derive(Clone)]
pub struct RpcHttpHandler {
    pub(crate) config: Arc<ServerConfig>,
    engine: Engine,
}

impl RpcHttpHandler {
    pub fn new(config: Arc<ServerConfig>, engine: Engine) -> Self {
        Self { config, engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Handle one HTTP request. Never fails: every outcome is an HTTP response.
    pub async fn handle_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if req.uri().path() != self.config.rpc_path {
            debug!(path = req.uri().path(), "no route");
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }
        if req.method() != Method::POST {
            debug!(method = %req.method(), "method not allowed");
            let mut response = plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(http::header::ALLOW, HeaderValue::from_static("POST"));
            return response;
        }

        let (parts, body) = req.into_parts();
        let body_bytes = match Limited::new(body, self.config.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                let too_large = err.is::<http_body_util::LengthLimitError>();
                if too_large {
                    warn!(limit = self.config.max_body_size, "request body too large");
                } else {
                    error!(error = %err, "failed to read request body");
                }
                let status = if too_large {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                return json(status, Bytes::from_static(SERVER_ERROR_BODY.as_bytes()));
            }
        };

        self.handle_body(&body_bytes, parts.headers).await
    }

    /// Dispatch an already-read body.
    pub async fn handle_body(&self, body: &[u8], headers: HeaderMap) -> Response<Full<Bytes>> {
        let text = match std::str::from_utf8(body) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "request body is not valid UTF-8");
                return self.parse_error();
            }
        };

        let mut extensions = Extensions::new();
        extensions.insert(HEADERS_KEY, headers);

        match self.engine.dispatch_with(text, extensions).await {
            Ok(Some(reply)) => json(StatusCode::OK, Bytes::from(reply)),
            Ok(None) => {
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::NO_CONTENT;
                response
            }
            Err(err) => {
                error!(error = %err, "failed to render reply");
                json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from_static(SERVER_ERROR_BODY.as_bytes()),
                )
            }
        }
    }

    fn parse_error(&self) -> Response<Full<Bytes>> {
        match jsonrpc_engine::Response::error(None, RpcError::parse_error()).to_json_string() {
            Ok(body) => json(StatusCode::OK, Bytes::from(body)),
            Err(_) => json(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(SERVER_ERROR_BODY.as_bytes()),
            ),
        }
    }
}

fn json(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}
