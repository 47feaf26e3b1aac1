//! Drives both listeners end to end with authenticated JSON-RPC clients.

use std::{
    io::Write,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use alloy_genesis::Genesis;
use alloy_primitives::{Address, B256, U256};
use alloy_rpc_types_engine::{Claims, JwtSecret};
use enginemock_chain::MockChain;
use enginemock_config::{RpcConfig, TimeoutConfig};
use enginemock_engine::EngineBackend;
use enginemock_primitives::{ExecutionStatus, ForkchoiceState, PayloadAttributes, PayloadId};
use enginemock_rpc_api::EngineApiClient;
use enginemock_rpc_server::{
    load_jwt_secret, start_engine_server, EngineServerHandle, INVALID_FORKCHOICE_STATE_CODE,
    INVALID_PAYLOAD_ATTRIBUTES_CODE, UNKNOWN_PAYLOAD_CODE,
};
use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{transport::HttpBackend, HttpClient, HttpClientBuilder},
    rpc_params,
    types::ErrorCode,
    ws_client::{WsClient, WsClientBuilder},
};
use reth_rpc_layer::{secret_to_bearer_header, AuthClientLayer, AuthClientService};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_util::sync::CancellationToken;

use hex as _;
use hyper_util as _;
use parking_lot as _;
use thiserror as _;
use tower_http as _;
use tracing as _;

const SECRET: &str = "f79ae8046bc11c9927afe911db7143c51a806c4a537cc08e0d37140b0192f430";

struct TestServer {
    handle: EngineServerHandle,
    chain: Arc<MockChain>,
    genesis_hash: B256,
    secret: JwtSecret,
}

async fn start_server() -> TestServer {
    start_server_with(TimeoutConfig::default()).await
}

async fn start_server_with(timeouts: TimeoutConfig) -> TestServer {
    let mut secret_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(secret_file, "{SECRET}").unwrap();
    let secret = load_jwt_secret(secret_file.path()).unwrap().secret;

    let mut genesis = Genesis::default();
    genesis.gas_limit = 30_000_000;
    genesis.difficulty = U256::from(1);
    genesis.config.terminal_total_difficulty = Some(U256::ZERO);
    let chain = Arc::new(MockChain::from_genesis(&genesis).unwrap());
    let genesis_hash = chain.genesis_hash();
    let backend = Arc::new(EngineBackend::new(chain.clone()));

    let config = RpcConfig {
        http_addr: "127.0.0.1:0".parse().unwrap(),
        ws_addr: "127.0.0.1:0".parse().unwrap(),
        timeouts,
        ..Default::default()
    };
    let handle = start_engine_server(&config, secret.clone(), backend, CancellationToken::new())
        .await
        .unwrap();

    TestServer {
        handle,
        chain,
        genesis_hash,
        secret,
    }
}

fn http_client(
    addr: SocketAddr,
    path: &str,
    secret: &JwtSecret,
) -> HttpClient<AuthClientService<HttpBackend>> {
    let middleware = tower::ServiceBuilder::new().layer(AuthClientLayer::new(secret.clone()));

    HttpClientBuilder::default()
        .set_http_middleware(middleware)
        .build(format!("http://{addr}{path}"))
        .unwrap()
}

/// HTTP client sending a fixed `Authorization` header, or none.
fn raw_http_client(addr: SocketAddr, auth: Option<HeaderValue>) -> HttpClient<HttpBackend> {
    let mut headers = HeaderMap::new();
    if let Some(auth) = auth {
        headers.insert(AUTHORIZATION, auth);
    }

    HttpClientBuilder::default()
        .set_headers(headers)
        .build(format!("http://{addr}"))
        .unwrap()
}

async fn try_ws_client(
    addr: SocketAddr,
    path: &str,
    auth: Option<HeaderValue>,
) -> Result<WsClient, ClientError> {
    let mut headers = HeaderMap::new();
    if let Some(auth) = auth {
        headers.insert(AUTHORIZATION, auth);
    }

    WsClientBuilder::default()
        .set_headers(headers)
        .build(format!("ws://{addr}{path}"))
        .await
}

async fn ws_client(addr: SocketAddr, path: &str, secret: &JwtSecret) -> WsClient {
    try_ws_client(addr, path, Some(secret_to_bearer_header(secret)))
        .await
        .unwrap()
}

/// Bearer header for a token issued at `iat`.
fn bearer_issued_at(secret: &JwtSecret, iat: u64) -> HeaderValue {
    let token = secret.encode(&Claims { iat, exp: None }).unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn payload_id_value(id: PayloadId) -> u64 {
    u64::from_be_bytes(id.0.into())
}

fn forkchoice(head: B256) -> ForkchoiceState {
    ForkchoiceState {
        head_block_hash: head,
        safe_block_hash: head,
        finalized_block_hash: B256::ZERO,
    }
}

fn attributes(timestamp: u64) -> PayloadAttributes {
    PayloadAttributes {
        timestamp,
        prev_randao: B256::ZERO,
        suggested_fee_recipient: Address::ZERO,
        withdrawals: None,
        parent_beacon_block_root: None,
    }
}

fn call_error_code(err: ClientError) -> i32 {
    match err {
        ClientError::Call(err) => err.code(),
        other => panic!("expected a call error, got {other:?}"),
    }
}

#[tokio::test]
async fn prepares_and_imports_payload() {
    let server = start_server().await;
    let http = http_client(server.handle.http_addr(), "/", &server.secret);
    let ws = ws_client(server.handle.ws_addr(), "/ws", &server.secret).await;

    let result = http
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap();
    assert_eq!(result.payload_status.status, ExecutionStatus::Valid);
    let id = result.payload_id.unwrap();

    // Prepared on one listener, fetched from the other.
    let payload = ws.get_payload_v1(id).await.unwrap();
    assert_eq!(payload.parent_hash, server.genesis_hash);
    assert_eq!(payload.timestamp, 1_000);

    let status = http.new_payload_v1(payload.clone()).await.unwrap();
    assert_eq!(status.status, ExecutionStatus::Valid);
    assert_eq!(status.latest_valid_hash, Some(payload.block_hash));

    let next = ws
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap()
        .payload_id
        .unwrap();
    assert_eq!(payload_id_value(next), payload_id_value(id) + 1);

    server.handle.shutdown();
    server.handle.stopped().await;
}

#[tokio::test]
async fn forkchoice_without_attributes_has_no_payload_id() {
    let server = start_server().await;
    let http = http_client(server.handle.http_addr(), "/", &server.secret);

    let result = http
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), None)
        .await
        .unwrap();

    assert_eq!(result.payload_status.status, ExecutionStatus::Valid);
    assert_eq!(result.payload_status.latest_valid_hash, Some(server.genesis_hash));
    assert_eq!(result.payload_id, None);
}

#[tokio::test]
async fn tampered_payload_has_invalid_block_hash() {
    let server = start_server().await;
    let http = http_client(server.handle.http_addr(), "/", &server.secret);

    let id = http
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap()
        .payload_id
        .unwrap();
    let mut payload = http.get_payload_v1(id).await.unwrap();
    payload.block_hash = B256::repeat_byte(0xee);

    let status = http.new_payload_v1(payload).await.unwrap();
    assert_eq!(status.status, ExecutionStatus::InvalidBlockHash);
}

#[tokio::test]
async fn engine_errors_use_dedicated_codes() {
    let server = start_server().await;
    let ws = ws_client(server.handle.ws_addr(), "/", &server.secret).await;

    let unknown = PayloadId::new([1, 2, 3, 4, 5, 6, 7, 8]);
    let err = ws.get_payload_v1(unknown).await.unwrap_err();
    assert_eq!(call_error_code(err), UNKNOWN_PAYLOAD_CODE);

    let err = ws
        .forkchoice_updated_v1(forkchoice(B256::repeat_byte(0x42)), Some(attributes(1_000)))
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), INVALID_FORKCHOICE_STATE_CODE);

    let err = ws
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(0)))
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), INVALID_PAYLOAD_ATTRIBUTES_CODE);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let server = start_server().await;
    let http_addr = server.handle.http_addr();
    let wrong_secret = JwtSecret::from_hex("11".repeat(32)).unwrap();

    let rejected = [
        raw_http_client(http_addr, None),
        raw_http_client(http_addr, Some(secret_to_bearer_header(&wrong_secret))),
        // Outside the allowed clock drift in either direction.
        raw_http_client(
            http_addr,
            Some(bearer_issued_at(&server.secret, unix_now() - 120)),
        ),
        raw_http_client(
            http_addr,
            Some(bearer_issued_at(&server.secret, unix_now() + 120)),
        ),
    ];
    for client in &rejected {
        let err = client
            .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)), "unexpected error {err:?}");
        assert!(err.to_string().contains("401"), "unexpected error {err}");
    }

    // A fresh token within the window is accepted.
    let fresh = raw_http_client(http_addr, Some(bearer_issued_at(&server.secret, unix_now())));
    let result = fresh
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), None)
        .await
        .unwrap();
    assert_eq!(result.payload_status.status, ExecutionStatus::Valid);
}

#[tokio::test]
async fn unauthenticated_ws_handshake_is_rejected() {
    let server = start_server().await;
    let ws_addr = server.handle.ws_addr();
    let wrong_secret = JwtSecret::from_hex("11".repeat(32)).unwrap();

    for auth in [None, Some(secret_to_bearer_header(&wrong_secret))] {
        let err = try_ws_client(ws_addr, "/", auth).await.unwrap_err();
        assert!(err.to_string().contains("401"), "unexpected error {err}");
    }
}

#[tokio::test]
async fn rejected_calls_have_no_side_effects() {
    let server = start_server().await;
    let wrong_secret = JwtSecret::from_hex("11".repeat(32)).unwrap();

    let unauthenticated = raw_http_client(server.handle.http_addr(), None);
    unauthenticated
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap_err();
    let wrong = http_client(server.handle.http_addr(), "/", &wrong_secret);
    wrong
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap_err();
    assert!(try_ws_client(server.handle.ws_addr(), "/", None).await.is_err());
    assert_eq!(server.chain.block_count(), 1);

    let http = http_client(server.handle.http_addr(), "/", &server.secret);
    let id = http
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap()
        .payload_id
        .unwrap();
    assert_eq!(payload_id_value(id), 1);
}

#[tokio::test]
async fn malformed_params_are_rejected() {
    let server = start_server().await;
    let http = http_client(server.handle.http_addr(), "/", &server.secret);

    let id = http
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), Some(attributes(1_000)))
        .await
        .unwrap()
        .payload_id
        .unwrap();
    let payload = http.get_payload_v1(id).await.unwrap();
    let blocks = server.chain.block_count();

    let mut malformed = serde_json::to_value(&payload).unwrap();
    malformed["blockNumber"] = serde_json::Value::String("zz".to_string());

    let err = http
        .request::<serde_json::Value, _>("engine_newPayloadV1", rpc_params![malformed])
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), ErrorCode::InvalidParams.code());
    assert_eq!(server.chain.block_count(), blocks);

    // The untouched payload still imports.
    let status = http.new_payload_v1(payload).await.unwrap();
    assert_eq!(status.status, ExecutionStatus::Valid);
}

#[tokio::test]
async fn idle_http_connection_is_closed() {
    let server = start_server_with(TimeoutConfig {
        idle_ms: 50,
        ..Default::default()
    })
    .await;

    let body = r#"{"jsonrpc":"2.0","id":1,"method":"engine_getPayloadV1","params":["0x0000000000000001"]}"#;
    let auth = secret_to_bearer_header(&server.secret);
    let request = format!(
        "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Authorization: {}\r\nContent-Length: {}\r\n\r\n{body}",
        auth.to_str().unwrap(),
        body.len()
    );

    let mut stream = TcpStream::connect(server.handle.http_addr()).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    // Keep-alive would hold the connection open, the idle timeout closes it.
    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("connection was not closed")
        .unwrap();

    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response {response}");
    assert!(response.contains("-38001"), "unexpected response {response}");
}

#[tokio::test]
async fn slow_request_headers_close_connection() {
    let server = start_server_with(TimeoutConfig {
        read_header_ms: 50,
        idle_ms: 0,
        ..Default::default()
    })
    .await;

    let mut stream = TcpStream::connect(server.handle.http_addr()).await.unwrap();
    stream
        .write_all(b"POST / HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();

    // Either a clean close or a reset, but not a connection left hanging.
    let mut response = Vec::new();
    let closed =
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    assert!(closed.is_ok(), "connection still open after header timeout");
}

#[tokio::test]
async fn ws_path_on_http_listener_is_rejected() {
    let server = start_server().await;
    let client = http_client(server.handle.http_addr(), "/ws", &server.secret);

    let err = client
        .forkchoice_updated_v1(forkchoice(server.genesis_hash), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "unexpected error {err:?}");
    assert!(err.to_string().contains("400"), "unexpected error {err}");
}

#[tokio::test]
async fn shutdown_closes_both_listeners() {
    let server = start_server().await;
    let http_addr = server.handle.http_addr();
    let ws_addr = server.handle.ws_addr();

    server.handle.shutdown();
    server.handle.shutdown();
    server.handle.stopped().await;

    assert!(TcpStream::connect(http_addr).await.is_err());
    assert!(TcpStream::connect(ws_addr).await.is_err());
}
