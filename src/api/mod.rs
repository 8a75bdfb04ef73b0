use crate::models::{Note, NotePatch, Tag};
use crate::session::SessionGuard;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// Credential missing/expired/rejected. Callers clear the session and
    /// route to login instead of retrying.
    Unauthorized,
    /// Backend rejected the input shape (400). Surfaced to the triggering
    /// flow only; no store mutation.
    Validation,
    /// Target vanished server-side (404). Rollback class.
    NotFound,
    /// Transport-level failure.
    Network,
    /// Any other non-success status.
    Http,
    /// Response body did not decode.
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn status(status: u16, body: String, ctx: &str) -> Self {
        Self {
            kind: classify_status(status),
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) fn classify_status(status: u16) -> ApiErrorKind {
    match status {
        401 | 403 => ApiErrorKind::Unauthorized,
        400 => ApiErrorKind::Validation,
        404 => ApiErrorKind::NotFound,
        _ => ApiErrorKind::Http,
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:8000/api".to_string();

        // Deployment overrides the backend location via `window.ENV.API_URL`.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn get_api_url() -> String {
    EnvConfig::new().api_url
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// SimpleJWT token pair. There is no refresh endpoint wired up on the
/// client; when the access token expires the user logs in again.
#[derive(Deserialize, Clone, Debug)]
pub(crate) struct TokenResponse {
    pub access: String,
    #[allow(dead_code)]
    pub refresh: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
struct CreateNoteRequest<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Serialize, Clone, Debug)]
struct ReorderRequest<'a> {
    ordered_ids: &'a [i64],
}

/// `GET /notes/` path with an optional urlencoded search term.
pub(crate) fn notes_search_path(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        "/notes/".to_string()
    } else {
        format!("/notes/?search={}", urlencoding::encode(query))
    }
}

/// Typed boundary to the note service. Carries the session guard so every
/// authenticated request presents the current bearer token.
#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) session: SessionGuard,
}

impl ApiClient {
    #[allow(dead_code)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            session: SessionGuard::default(),
        }
    }

    pub fn load_from_storage() -> Self {
        Self {
            base_url: get_api_url(),
            session: SessionGuard::load(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    pub fn establish_session(&mut self, token: String) {
        self.session.establish(token);
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
    }

    fn with_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        }
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
        ctx: &str,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.with_auth_header(client.request(method, url));

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::status(status, body, ctx))
        }
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
        ctx: &str,
    ) -> ApiResult<T> {
        let res = self.send(method, path, body, ctx).await?;
        res.json().await.map_err(ApiError::parse)
    }

    async fn request_ack(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
        ctx: &str,
    ) -> ApiResult<()> {
        self.send(method, path, body, ctx).await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<TokenResponse> {
        self.request_json(
            reqwest::Method::POST,
            "/token/",
            Some(&CredentialsRequest {
                username: username.to_string(),
                password: password.to_string(),
            }),
            "Login failed",
        )
        .await
    }

    pub async fn register(&self, username: &str, password: &str) -> ApiResult<()> {
        self.request_ack(
            reqwest::Method::POST,
            "/register/",
            Some(&CredentialsRequest {
                username: username.to_string(),
                password: password.to_string(),
            }),
            "Registration failed",
        )
        .await
    }

    /// Ordered note list, optionally narrowed by a search term. The order
    /// the backend returns is the persisted manual order.
    pub async fn search_notes(&self, query: &str) -> ApiResult<Vec<Note>> {
        self.request_json(
            reqwest::Method::GET,
            &notes_search_path(query),
            None::<&()>,
            "Loading notes failed",
        )
        .await
    }

    pub async fn create_note(&self, title: &str, content: &str) -> ApiResult<Note> {
        self.request_json(
            reqwest::Method::POST,
            "/notes/",
            Some(&CreateNoteRequest { title, content }),
            "Creating note failed",
        )
        .await
    }

    pub async fn patch_note(&self, id: i64, patch: &NotePatch) -> ApiResult<Note> {
        self.request_json(
            reqwest::Method::PATCH,
            &format!("/notes/{id}/"),
            Some(patch),
            "Saving note failed",
        )
        .await
    }

    pub async fn reorder_notes(&self, ordered_ids: &[i64]) -> ApiResult<()> {
        self.request_ack(
            reqwest::Method::POST,
            "/notes/reorder/",
            Some(&ReorderRequest { ordered_ids }),
            "Reordering notes failed",
        )
        .await
    }

    pub async fn delete_note(&self, id: i64) -> ApiResult<()> {
        self.request_ack(
            reqwest::Method::DELETE,
            &format!("/notes/{id}/"),
            None::<&()>,
            "Deleting note failed",
        )
        .await
    }

    pub async fn get_tags(&self) -> ApiResult<Vec<Tag>> {
        self.request_json(
            reqwest::Method::GET,
            "/tags/",
            None::<&()>,
            "Loading tags failed",
        )
        .await
    }
}
