//! In-process fake of the HR API used by the integration tests
#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use client::{ClientConfig, SessionClient};
use common::{MemoryStore, SessionStore};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const EMAIL: &str = "jane@example.com";
pub const PASSWORD: &str = "secret1";
pub const REFRESHED_ACCESS: &str = "refreshed-access";

/// Request observed by the fake server
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

pub struct FakeState {
    pub valid_access: String,
    pub valid_refresh: String,
    /// Answer 401 to every authenticated endpoint, whatever the token
    pub reject_everything: bool,
    pub refresh_calls: usize,
    pub requests: Vec<Seen>,
    pub records: Value,
    pub submissions: Vec<Value>,
    pub submit_response: Option<(StatusCode, Value)>,
    pub geocode_response: (StatusCode, Value),
    pub geocode_queries: Vec<HashMap<String, String>>,
}

#[derive(Clone)]
pub struct FakeHr(Arc<Mutex<FakeState>>);

impl FakeHr {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(FakeState {
            valid_access: "valid-access".to_string(),
            valid_refresh: "valid-refresh".to_string(),
            reject_everything: false,
            refresh_calls: 0,
            requests: Vec::new(),
            records: json!([]),
            submissions: Vec::new(),
            submit_response: None,
            geocode_response: (
                StatusCode::OK,
                json!({ "display_name": "1 Main Street, Springfield" }),
            ),
            geocode_queries: Vec::new(),
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.0.lock().expect("fake state poisoned")
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state().requests.iter().filter(|r| r.path == path).count()
    }

    pub fn authorizations(&self, path: &str) -> Vec<Option<String>> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.authorization.clone())
            .collect()
    }

    pub fn content_types(&self, path: &str) -> Vec<Option<String>> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.content_type.clone())
            .collect()
    }

    fn record(&self, path: &str, headers: &HeaderMap) {
        let header_value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let seen = Seen {
            path: path.to_string(),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
        };
        self.state().requests.push(seen);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let state = self.state();
        if state.reject_everything {
            return false;
        }
        let expected = format!("Bearer {}", state.valid_access);
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str())
    }
}

type Reply = (StatusCode, Json<Value>);

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })),
    )
}

async fn login(State(fake): State<FakeHr>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    fake.record("login/", &headers);
    let state = fake.state();
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some(EMAIL), Some(PASSWORD)) => (
            StatusCode::OK,
            Json(json!({
                "status": true,
                "message": "Login successful",
                "data": {
                    "access_token": state.valid_access,
                    "refresh_token": state.valid_refresh,
                    "email": EMAIL
                }
            })),
        ),
        (Some("inactive@example.com"), _) => (
            StatusCode::OK,
            Json(json!({ "status": false, "message": "Account is inactive" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": false, "message": "Invalid credentials" })),
        ),
    }
}

async fn refresh(State(fake): State<FakeHr>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    fake.record("token/refresh/", &headers);
    let mut state = fake.state();
    state.refresh_calls += 1;
    if body["refresh"].as_str() == Some(state.valid_refresh.as_str()) {
        state.valid_access = REFRESHED_ACCESS.to_string();
        (StatusCode::OK, Json(json!({ "access": REFRESHED_ACCESS })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "detail": "Token is invalid or expired",
                "code": "token_not_valid"
            })),
        )
    }
}

async fn user_view(State(fake): State<FakeHr>, headers: HeaderMap) -> Reply {
    fake.record("user/view", &headers);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": true,
            "data": {
                "first_name": "Jane",
                "last_name": "Doe",
                "email": EMAIL,
                "employee_id": "EMP-007",
                "employee": { "designation": "Field Engineer" },
                "profile_image_url": "https://cdn.example.com/jane.png"
            }
        })),
    )
}

async fn list_attendance(State(fake): State<FakeHr>, headers: HeaderMap) -> Reply {
    fake.record("attendance/", &headers);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    let records = fake.state().records.clone();
    (StatusCode::OK, Json(json!({ "results": records })))
}

async fn submit_attendance(
    State(fake): State<FakeHr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    fake.record("attendance/", &headers);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    let mut state = fake.state();
    state.submissions.push(body);
    match state.submit_response.clone() {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::OK,
            Json(json!({ "status": true, "message": "Attendance recorded" })),
        ),
    }
}

async fn upload(State(fake): State<FakeHr>, headers: HeaderMap, body: Bytes) -> Reply {
    fake.record("upload/", &headers);
    if !fake.authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({ "status": true, "size": body.len() })),
    )
}

async fn reverse(
    State(fake): State<FakeHr>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    fake.record("reverse", &headers);
    let mut state = fake.state();
    state.geocode_queries.push(params);
    let (status, body) = state.geocode_response.clone();
    (status, Json(body))
}

fn router(fake: FakeHr) -> Router {
    Router::new()
        .route("/hrms/api/v1/login/", post(login))
        .route("/hrms/api/v1/token/refresh/", post(refresh))
        .route("/hrms/api/v1/user/view", get(user_view))
        .route(
            "/hrms/api/v1/attendance/",
            get(list_attendance).post(submit_attendance),
        )
        .route("/hrms/api/v1/upload/", post(upload))
        .route("/reverse", get(reverse))
        .with_state(fake)
}

/// Serve the fake on an ephemeral port and return its origin
pub async fn spawn(fake: FakeHr) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, router(fake)).await.expect("serve app") });
    format!("http://{addr}")
}

pub fn config_for(origin: &str) -> ClientConfig {
    ClientConfig {
        base_url: format!("{origin}/hrms/api/v1/"),
        geocode_url: format!("{origin}/reverse"),
        request_timeout_secs: 5,
        ..ClientConfig::default()
    }
}

/// Client talking to the fake, with an empty in-memory session
pub fn client_for(origin: &str) -> (SessionClient, SessionStore) {
    let session = SessionStore::new(Arc::new(MemoryStore::new()));
    let client = SessionClient::new(&config_for(origin), session.clone()).expect("build client");
    (client, session)
}
