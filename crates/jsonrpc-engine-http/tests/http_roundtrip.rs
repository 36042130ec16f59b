//! End-to-end tests over a real TCP listener

use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};

use jsonrpc_engine::prelude::*;
use jsonrpc_engine_http::HttpRpcServer;

#[derive(Deserialize)]
struct Args {
    x: i64,
    y: i64,
}

fn sum(ctx: &mut Context) {
    match ctx.bind_json::<Args>() {
        Ok(Args { x, y }) => ctx.set_int(x + y),
        Err(err) => ctx.set_error(err),
    }
}

async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let engine = Engine::builder().register("sum", sum).build();
    let server = HttpRpcServer::builder(engine).build();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    (addr, task)
}

async fn send(addr: SocketAddr, method: Method, path: &str, body: &str) -> (StatusCode, Bytes) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = Request::builder()
        .method(method)
        .uri(path)
        .header("host", addr.to_string())
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap();
    let response = sender.send_request(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes)
}

#[tokio::test]
async fn test_sum_over_http() {
    let (addr, server) = start_server().await;

    let (status, body) = send(
        addr,
        Method::POST,
        "/rpc",
        r#"{"jsonrpc":"2.0","method":"sum","params":{"x":2,"y":3},"id":1}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"jsonrpc":"2.0","result":5,"id":1}"#
    );
    server.abort();
}

#[tokio::test]
async fn test_batch_over_http() {
    let (addr, server) = start_server().await;

    let (status, body) = send(
        addr,
        Method::POST,
        "/rpc",
        r#"[
            {"jsonrpc":"2.0","method":"sum","params":{"x":1,"y":1},"id":"a"},
            {"jsonrpc":"2.0","method":"sum","params":{"x":1,"y":1}},
            {"jsonrpc":"2.0","method":"missing","id":"b"}
        ]"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let replies: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        replies,
        json!([
            {"jsonrpc": "2.0", "result": 2, "id": "a"},
            {"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found"}, "id": "b"}
        ])
    );
    server.abort();
}

#[tokio::test]
async fn test_invalid_params_over_http() {
    let (addr, server) = start_server().await;

    let (_, body) = send(
        addr,
        Method::POST,
        "/rpc",
        r#"{"jsonrpc":"2.0","method":"sum","params":{"x":"two","y":3},"id":9}"#,
    )
    .await;

    let reply: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply["error"]["code"], json!(-32602));
    assert_eq!(reply["id"], json!(9));
    server.abort();
}

#[tokio::test]
async fn test_notification_over_http() {
    let (addr, server) = start_server().await;

    let (status, body) = send(
        addr,
        Method::POST,
        "/rpc",
        r#"{"jsonrpc":"2.0","method":"sum","params":{"x":1,"y":2}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    server.abort();
}

#[tokio::test]
async fn test_parse_error_over_http() {
    let (addr, server) = start_server().await;

    let (status, body) = send(addr, Method::POST, "/rpc", "not json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}"#
    );
    server.abort();
}

#[tokio::test]
async fn test_unknown_path_over_http() {
    let (addr, server) = start_server().await;

    let (status, _) = send(addr, Method::POST, "/elsewhere", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(addr, Method::GET, "/rpc", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    server.abort();
}
