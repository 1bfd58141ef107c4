use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EchoReply {
    pub method: String,
    pub content_type: Option<String>,
    /// Set when the request carried a cookie issued by `/session`.
    pub session: Option<Uuid>,
    pub body: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// Session ids issued by `/session`. Never pruned: the set grows for the
/// life of the process, which is fine for a test fixture.
pub type Sessions = Arc<RwLock<HashSet<Uuid>>>;

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashSet::new()));
    Router::new()
        .route("/echo", post(echo))
        .route("/ok", post(ok))
        .route("/bad", post(bad))
        .route("/garbage", post(garbage))
        .route("/session", post(start_session))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    State(sessions): State<Sessions>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Result<Json<EchoReply>, (StatusCode, Json<ErrorReply>)> {
    let body: Value = serde_json::from_str(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorReply {
                error: e.to_string(),
            }),
        )
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let session = match session_cookie(&headers) {
        Some(id) if sessions.read().await.contains(&id) => Some(id),
        _ => None,
    };

    debug!(%method, ?content_type, ?session, "echo");
    Ok(Json(EchoReply {
        method: method.to_string(),
        content_type,
        session,
        body,
    }))
}

async fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn bad() -> (StatusCode, Json<ErrorReply>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorReply {
            error: "bad".to_string(),
        }),
    )
}

async fn garbage() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<html>definitely not json</html>")
}

async fn start_session(State(sessions): State<Sessions>) -> ([(header::HeaderName, String); 1], Json<Value>) {
    let id = Uuid::new_v4();
    sessions.write().await.insert(id);
    debug!(%id, "session started");
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly"))],
        Json(json!({ "ok": true })),
    )
}

/// Pull the session id out of a `Cookie` header, if one is present and well formed.
fn session_cookie(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}
