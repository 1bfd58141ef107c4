//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and exercises `Fetcher` over real
//! HTTP. The last test executes a request built by `ApiClient` with ureq to
//! check that the host-does-IO path works with an unrelated HTTP stack.

use std::net::SocketAddr;

use api_core::{
    post_json, ApiClient, ApiConfig, ApiError, FetchOptions, Fetcher, HttpMethod, HttpRequest,
    HttpResponse, RequestCredentials,
};
use mock_server::EchoReply;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    addr
}

fn fetcher(addr: SocketAddr) -> Fetcher {
    Fetcher::new(ApiConfig::new(&format!("http://{addr}")).unwrap()).unwrap()
}

/// An address nothing is listening on.
fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

struct Cyclic;

impl Serialize for Cyclic {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cyclic structure"))
    }
}

#[tokio::test]
async fn ok_response_resolves_to_value() {
    let addr = spawn_server().await;
    let value = fetcher(addr).post_json("/ok", &json!({})).await.unwrap();
    assert_eq!(value, json!({"ok": true}));
}

#[tokio::test]
async fn error_status_still_resolves_to_body() {
    let addr = spawn_server().await;
    let value = fetcher(addr).post_json("/bad", &json!({})).await.unwrap();
    assert_eq!(value, json!({"error": "bad"}));
}

#[tokio::test]
async fn invalid_json_response_is_an_error() {
    let addr = spawn_server().await;
    let err = fetcher(addr).post_json("/garbage", &json!({})).await.unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)));
}

#[tokio::test]
async fn request_carries_post_json_and_body() {
    let addr = spawn_server().await;
    let body = json!({
        "username": "ada",
        "email": "ada@example.com",
        "scores": [1, 2.5, -3],
        "meta": {"admin": false, "nick": null}
    });

    let reply: EchoReply = fetcher(addr).post_json_as("echo", &body).await.unwrap();
    assert_eq!(reply.method, "POST");
    assert_eq!(reply.content_type.as_deref(), Some("application/json"));
    assert_eq!(reply.body, body);
}

#[tokio::test]
async fn credentials_include_sends_stored_cookies() {
    let addr = spawn_server().await;
    let f = fetcher(addr);

    let before: EchoReply = f.post_json_as("/echo", &json!({})).await.unwrap();
    assert_eq!(before.session, None);

    f.post_json("/session", &json!({})).await.unwrap();

    let after: EchoReply = f.post_json_as("/echo", &json!({})).await.unwrap();
    assert!(after.session.is_some());
}

#[tokio::test]
async fn credentials_omit_drops_cookies() {
    let addr = spawn_server().await;
    let options = FetchOptions {
        credentials: RequestCredentials::Omit,
        ..FetchOptions::default()
    };
    let config = ApiConfig::new(&format!("http://{addr}")).unwrap().with_options(options);
    let f = Fetcher::new(config).unwrap();

    f.post_json("/session", &json!({})).await.unwrap();

    let reply: EchoReply = f.post_json_as("/echo", &json!({})).await.unwrap();
    assert_eq!(reply.session, None);
}

#[tokio::test]
async fn unserializable_body_fails_before_network() {
    // A send would surface as a transport error, not a serialization error.
    let f = fetcher(closed_addr());
    let err = f.post_json("/ok", &Cyclic).await.unwrap_err();
    assert!(matches!(err, ApiError::Serialization(_)));
}

#[tokio::test]
async fn invalid_header_option_rejects_the_call() {
    let addr = spawn_server().await;
    let options = FetchOptions {
        headers: vec![("content type".to_string(), "application/json".to_string())],
        ..FetchOptions::default()
    };
    let config = ApiConfig::new(&format!("http://{addr}")).unwrap().with_options(options);
    let f = Fetcher::new(config).unwrap();

    let err = f.post_json("/echo", &json!({"a": 1})).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidHeader { ref name } if name == "content type"));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let f = fetcher(closed_addr());
    let err = f.post_json("/ok", &json!({})).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn crate_level_post_json_with_absolute_address() {
    let addr = spawn_server().await;
    let value = post_json(&format!("http://{addr}/ok"), &json!({"hello": "world"}))
        .await
        .unwrap();
    assert_eq!(value, json!({"ok": true}));

    let err = post_json("/ok", &Cyclic).await.unwrap_err();
    assert!(matches!(err, ApiError::Serialization(_)));
}

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's status-code-as-error behavior so 4xx/5xx responses come
/// back as data.
fn execute_with_ureq(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    assert_eq!(req.method, HttpMethod::Post);
    let mut builder = agent.post(&req.url);
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let mut response = builder
        .send(req.body.unwrap_or_default().as_bytes())
        .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

#[test]
fn host_does_io_round_trip() {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let client = ApiClient::new(ApiConfig::new(&format!("http://{addr}")).unwrap());

    let req = client.build_post_json("/echo", &json!({"n": 1})).unwrap();
    let echoed: Value = client.parse_json(execute_with_ureq(req)).unwrap();
    assert_eq!(echoed["body"], json!({"n": 1}));
    assert_eq!(echoed["content_type"], "application/json");

    let req = client.build_post_json("/bad", &json!({})).unwrap();
    let response = execute_with_ureq(req);
    assert_eq!(response.status, 400);
    assert_eq!(client.parse_json(response).unwrap(), json!({"error": "bad"}));

    let req = client.build_post_json("/garbage", &json!({})).unwrap();
    let err = client.parse_json(execute_with_ureq(req)).unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)));
}
