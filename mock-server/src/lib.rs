//! In-memory stand-in for the Blesta API.
//!
//! Serves `/api/{model}/{method}.json` with either authentication scheme,
//! a small `clients` model, and a few `debug` endpoints that expose how a
//! request arrived. Error bodies follow Blesta's shape:
//! `{"message": ..., "errors": {...}, "response": null}`.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const USER_HEADER: &str = "blesta-api-user";
pub const KEY_HEADER: &str = "blesta-api-key";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: String,
}

#[derive(Clone)]
pub struct AppState {
    user: Arc<str>,
    key: Arc<str>,
    clients: Arc<RwLock<BTreeMap<u64, Client>>>,
    next_id: Arc<AtomicU64>,
}

/// Which scheme a request authenticated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthKind {
    Basic,
    Header,
}

impl AuthKind {
    fn as_str(self) -> &'static str {
        match self {
            AuthKind::Basic => "basic",
            AuthKind::Header => "header",
        }
    }
}

pub fn app(user: &str, key: &str) -> Router {
    let state = AppState {
        user: user.into(),
        key: key.into(),
        clients: Arc::default(),
        next_id: Arc::new(AtomicU64::new(1)),
    };
    Router::new()
        .route("/api/{model}/{action}", any(dispatch))
        .with_state(state)
}

pub async fn run(listener: TcpListener, user: &str, key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(user, key)).await
}

async fn dispatch(
    State(state): State<AppState>,
    Path((model, action)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    let Some(auth) = authenticate(&state, &headers) else {
        tracing::info!(%model, %action, "rejected unauthenticated request");
        return failure(
            StatusCode::UNAUTHORIZED,
            "The authorization details given appear to be invalid.",
            None,
        );
    };
    let Some(action) = action.strip_suffix(".json") else {
        return not_found();
    };
    let query = query.unwrap_or_default();
    tracing::debug!(%method, %model, %action, "handling request");

    match (model.as_str(), action, &method) {
        ("debug", "echo", _) => {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            success(json!({
                "method": method.as_str(),
                "query": query,
                "body": body,
                "content_type": content_type,
                "auth": auth.as_str(),
            }))
        }
        ("debug", "crash", _) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        ("clients", "add", &Method::POST) => add_client(&state, &form(&body)).await,
        ("clients", "get", &Method::GET) => get_client(&state, &form(&query)).await,
        ("clients", "getAll", &Method::GET) => {
            let clients = state.clients.read().await;
            success(json!(clients.values().collect::<Vec<_>>()))
        }
        ("clients", "edit", &Method::PUT) => edit_client(&state, &form(&body)).await,
        ("clients", "delete", &Method::DELETE) => delete_client(&state, &form(&body)).await,
        _ => not_found(),
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<AuthKind> {
    let value_of = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let (Some(user), Some(key)) = (value_of(USER_HEADER), value_of(KEY_HEADER)) {
        return (user == &*state.user && key == &*state.key).then_some(AuthKind::Header);
    }

    let token = value_of(header::AUTHORIZATION.as_str())?.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(token).ok()?).ok()?;
    let (user, key) = decoded.split_once(':')?;
    (user == &*state.user && key == &*state.key).then_some(AuthKind::Basic)
}

/// Decode a form-encoded string into flat `key => value` pairs.
fn form(encoded: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(encoded.as_bytes()).into_owned().collect()
}

async fn add_client(state: &AppState, fields: &BTreeMap<String, String>) -> Response {
    let var = |name: &str| fields.get(&format!("vars[{name}]")).cloned().unwrap_or_default();

    let email = var("email");
    if !email.contains('@') {
        return invalid_email();
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let client = Client {
        id,
        first_name: var("first_name"),
        last_name: var("last_name"),
        email,
        status: "active".to_string(),
    };
    state.clients.write().await.insert(id, client.clone());
    success(json!(client))
}

async fn get_client(state: &AppState, fields: &BTreeMap<String, String>) -> Response {
    let clients = state.clients.read().await;
    let client = client_id(fields).and_then(|id| clients.get(&id));
    success(json!(client))
}

async fn edit_client(state: &AppState, fields: &BTreeMap<String, String>) -> Response {
    let mut clients = state.clients.write().await;
    let Some(client) = client_id(fields).and_then(|id| clients.get_mut(&id)) else {
        return not_found();
    };
    if let Some(email) = fields.get("vars[email]") {
        if !email.contains('@') {
            return invalid_email();
        }
        client.email = email.clone();
    }
    if let Some(first_name) = fields.get("vars[first_name]") {
        client.first_name = first_name.clone();
    }
    if let Some(last_name) = fields.get("vars[last_name]") {
        client.last_name = last_name.clone();
    }
    success(json!(client))
}

async fn delete_client(state: &AppState, fields: &BTreeMap<String, String>) -> Response {
    let mut clients = state.clients.write().await;
    match client_id(fields).and_then(|id| clients.remove(&id)) {
        Some(_) => success(json!(true)),
        None => not_found(),
    }
}

fn client_id(fields: &BTreeMap<String, String>) -> Option<u64> {
    fields.get("client_id")?.parse().ok()
}

fn success(response: Value) -> Response {
    (StatusCode::OK, Json(json!({ "response": response }))).into_response()
}

fn failure(status: StatusCode, message: &str, errors: Option<Value>) -> Response {
    let mut body = json!({ "message": message, "response": null });
    if let Some(errors) = errors {
        body["errors"] = errors;
    }
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    failure(StatusCode::NOT_FOUND, "The requested resource does not exist.", None)
}

fn invalid_email() -> Response {
    failure(
        StatusCode::BAD_REQUEST,
        "An error occurred while processing the request.",
        Some(json!({ "email": { "format": "Please enter a valid email address." } })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState {
            user: "admin".into(),
            key: "secret".into(),
            clients: Arc::default(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    #[test]
    fn accepts_header_credentials() {
        let h = headers(&[(USER_HEADER, "admin"), (KEY_HEADER, "secret")]);
        assert_eq!(authenticate(&state(), &h), Some(AuthKind::Header));
    }

    #[test]
    fn accepts_basic_credentials() {
        // base64("admin:secret")
        let h = headers(&[("authorization", "Basic YWRtaW46c2VjcmV0")]);
        assert_eq!(authenticate(&state(), &h), Some(AuthKind::Basic));
    }

    #[test]
    fn rejects_wrong_or_missing_credentials() {
        assert_eq!(authenticate(&state(), &HeaderMap::new()), None);
        let h = headers(&[(USER_HEADER, "admin"), (KEY_HEADER, "wrong")]);
        assert_eq!(authenticate(&state(), &h), None);
        let h = headers(&[("authorization", "Basic not-base64!")]);
        assert_eq!(authenticate(&state(), &h), None);
    }

    #[test]
    fn form_decodes_bracketed_keys() {
        let fields = form("vars%5Bfirst_name%5D=Jane&vars%5Bemail%5D=jane%40example.com&client_id=4");
        assert_eq!(fields.get("vars[first_name]").map(String::as_str), Some("Jane"));
        assert_eq!(fields.get("vars[email]").map(String::as_str), Some("jane@example.com"));
        assert_eq!(client_id(&fields), Some(4));
    }

    #[test]
    fn client_serializes_to_json() {
        let client = Client {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            status: "active".to_string(),
        };
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["email"], "jane@example.com");
    }
}
