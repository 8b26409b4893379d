//! Transport wrapper for the file-sharing API.

use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use reqwest::header;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiErrorKind, ApiResult};

/// Standard User-Agent header for sealdrop API requests.
pub const USER_AGENT: &str = concat!("sealdrop/", env!("CARGO_PKG_VERSION"));

/// Shared handle to the current session token.
///
/// The client reads the token fresh on every request; only the session (the
/// single authorized mutation path) writes it. Cloning the handle shares the
/// underlying slot.
#[derive(Debug, Clone, Default)]
pub struct TokenHandle {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenHandle {
    /// Creates a handle seeded with an optional persisted token.
    pub fn new(initial: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Returns the current token, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.read().expect("token lock poisoned").clone()
    }

    /// Replaces the token. Crate-internal: session transitions only.
    pub(crate) fn replace(&self, token: Option<String>) {
        *self.inner.write().expect("token lock poisoned") = token;
    }
}

/// Whether a request carries the session bearer token.
///
/// The public allow-list (login, register, public link download) maps to
/// [`Auth::Public`]; everything else is [`Auth::Bearer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Bearer,
    Public,
}

/// Content fetched from a download endpoint.
#[derive(Debug, Clone)]
pub struct DownloadedContent {
    pub bytes: Vec<u8>,
    /// Filename the server suggested via Content-Disposition, if any.
    pub filename: Option<String>,
}

/// HTTP client for the file-sharing API.
///
/// Owns the base URL and a [`TokenHandle`]; attaches `Authorization: Bearer`
/// to protected requests and normalizes failures into [`ApiError`]. No
/// timeouts are configured and nothing is ever retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenHandle,
}

impl ApiClient {
    /// Creates a client for the given base URL.
    ///
    /// The URL is expected to be pre-validated (see `Config::resolve_base_url`);
    /// a trailing slash is tolerated and stripped.
    pub fn new(base_url: impl Into<String>, token: TokenHandle) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Returns the base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attaches credentials, sends, and normalizes non-success responses.
    ///
    /// The token is looked up at call time, never captured earlier; a missing
    /// token on a protected request fails before any network dispatch.
    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        auth: Auth,
        fallback: &str,
    ) -> ApiResult<reqwest::Response> {
        let builder = match auth {
            Auth::Bearer => {
                let Some(token) = self.token.current() else {
                    return Err(ApiError::new(ApiErrorKind::Unauthorized, "Not signed in"));
                };
                builder.header(header::AUTHORIZATION, format!("Bearer {token}"))
            }
            Auth::Public => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::network(&e, fallback))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status.as_u16(), &body, fallback);
        tracing::debug!(status = status.as_u16(), kind = %err.kind, "request failed");
        Err(err)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        auth: Auth,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = self
            .execute(self.http.get(self.endpoint(path)), auth, fallback)
            .await?;
        response.json().await.map_err(|e| ApiError::parse(&e, fallback))
    }

    pub(crate) async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        auth: Auth,
        fallback: &str,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.http.post(self.endpoint(path)).json(body), auth, fallback)
            .await?;
        response.json().await.map_err(|e| ApiError::parse(&e, fallback))
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = self
            .execute(
                self.http.post(self.endpoint(path)).multipart(form),
                Auth::Bearer,
                fallback,
            )
            .await?;
        response.json().await.map_err(|e| ApiError::parse(&e, fallback))
    }

    pub(crate) async fn delete(&self, path: &str, fallback: &str) -> ApiResult<()> {
        self.execute(self.http.delete(self.endpoint(path)), Auth::Bearer, fallback)
            .await?;
        Ok(())
    }

    pub(crate) async fn get_bytes(
        &self,
        path: &str,
        auth: Auth,
        fallback: &str,
    ) -> ApiResult<DownloadedContent> {
        let response = self
            .execute(self.http.get(self.endpoint(path)), auth, fallback)
            .await?;

        let filename = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_attachment_filename);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(&e, fallback))?;

        Ok(DownloadedContent {
            bytes: bytes.to_vec(),
            filename,
        })
    }
}

/// Extracts the plain `filename="..."` parameter from a Content-Disposition
/// header. The extended `filename*=` form is ignored; callers fall back to a
/// caller-chosen name when absent.
fn parse_attachment_filename(header: &str) -> Option<String> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename=") {
            let name = value.trim_matches('"').trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}
