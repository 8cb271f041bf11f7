//! Session-aware HTTP client
//!
//! Every request except login carries `Authorization: Bearer <token>` when
//! an access token is persisted. A 401 triggers exactly one refresh through
//! the refresh endpoint followed by one replay of the original request; the
//! outcome reports whether that happened instead of mutating the request.

use common::SessionStore;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{RefreshRequest, RefreshResponse};

/// Body of an outbound request
///
/// Forms are kept as plain parts so the request can be rebuilt for the
/// replay after a token refresh.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<FormPart>),
}

/// One field of a multipart form
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                mime: mime.into(),
                bytes,
            },
        }
    }
}

/// Outbound request against the HR API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post(path: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body,
        }
    }
}

/// Successful response of the HR API
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
    /// The first attempt got a 401 and this response comes from the replay
    /// after a token refresh
    pub auth_retried: bool,
}

impl ApiResponse {
    /// Decode the body
    pub fn into_json<T: DeserializeOwned>(self) -> ClientResult<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// Raw response of a single attempt
struct Attempt {
    status: StatusCode,
    body: Value,
}

impl Attempt {
    fn finish(self, auth_retried: bool) -> ClientResult<ApiResponse> {
        if self.status.is_success() {
            Ok(ApiResponse {
                status: self.status,
                body: self.body,
                auth_retried,
            })
        } else {
            Err(ClientError::Http {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// HTTP client bound to the HR API base URL and the device session
#[derive(Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
    login_path: String,
    refresh_path: String,
    session: SessionStore,
}

impl SessionClient {
    /// Create a new client for the configured API
    pub fn new(config: &ClientConfig, session: SessionStore) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        info!("HR API client initialized with base URL: {}", config.base_url);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            refresh_path: config.refresh_path.clone(),
            session,
        })
    }

    /// Session context used for token reads and writes
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Absolute URL of `path`; absolute URLs are used as they are
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Whether `path` resolves to the login endpoint itself
    fn is_login(&self, path: &str) -> bool {
        if self.login_path.trim_matches('/').is_empty() {
            return false;
        }
        let login = self.endpoint(&self.login_path);
        self.endpoint(path).trim_end_matches('/') == login.trim_end_matches('/')
    }

    pub async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: RequestBody) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::post(path, body)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.post(path, RequestBody::Json(body)).await
    }

    /// Send a request, refreshing the access token and replaying the request
    /// once if the API answers 401
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let first = self.dispatch(&request).await?;

        if first.status != StatusCode::UNAUTHORIZED || self.is_login(&request.path) {
            return first.finish(false);
        }

        warn!(
            "Received 401 for {} {}, attempting token refresh",
            request.method, request.path
        );

        let Some(refresh_token) = self.session.refresh_token().await? else {
            error!("No refresh token available, propagating 401");
            return first.finish(false);
        };

        let access_token = match self.refresh(&refresh_token).await {
            Ok(access_token) => access_token,
            Err(e) => {
                error!("Token refresh failed: {}", e);
                self.session.clear_tokens().await?;
                return Err(ClientError::RefreshFailed(Box::new(e)));
            }
        };

        self.session.set_access_token(&access_token).await?;
        info!("Access token refreshed, replaying {} {}", request.method, request.path);

        self.dispatch(&request).await?.finish(true)
    }

    /// Perform a single attempt with the currently persisted access token
    async fn dispatch(&self, request: &ApiRequest) -> ClientResult<Attempt> {
        let url = self.endpoint(&request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !self.is_login(&request.path) {
            if let Some(token) = self.session.access_token().await? {
                builder = builder.bearer_auth(token);
            }
        }

        builder = match &request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Form(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        debug!("{} {} -> {}", request.method, url, status);

        Ok(Attempt {
            status,
            body: parse_body(&bytes),
        })
    }

    /// Exchange the refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> ClientResult<String> {
        let url = self.endpoint(&self.refresh_path);
        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        let body = parse_body(&response.bytes().await?);

        if !status.is_success() {
            return Err(ClientError::Http { status, body });
        }

        let RefreshResponse { access } = serde_json::from_value(body)?;
        Ok(access)
    }
}

fn build_form(parts: &[FormPart]) -> ClientResult<Form> {
    let mut form = Form::new();
    for part in parts {
        form = match &part.value {
            FormValue::Text(value) => form.text(part.name.clone(), value.clone()),
            FormValue::File {
                file_name,
                mime,
                bytes,
            } => form.part(
                part.name.clone(),
                Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)?,
            ),
        };
    }
    Ok(form)
}

/// Bodies are JSON in practice; anything else is kept as text
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
