//! HTTP request executor for the PokeCollect API.
//!
//! # Design
//! `ApiClient` holds the base URL plus two injected capabilities: the
//! `Transport` that performs I/O and the `SecretStore` that holds the bearer
//! token. A call is split into `build_request` (pure apart from reading the
//! token), one `Transport::execute`, and `parse_response` (pure). Nothing is
//! retried; every outcome is exactly one decoded value or one `ApiError`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::credentials::SecretStore;
use crate::error::{ApiError, ErrorEnvelope};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

/// Async client for the PokeCollect REST API.
///
/// Cloning is cheap: clones share the transport and the secret store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SecretStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, store: Arc<dyn SecretStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Build the request for `path` (server-relative, leading `/`).
    ///
    /// Attaches `Authorization: Bearer <token>` when the store holds a
    /// token; a store read failure is treated as having no token.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpRequest, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        if reqwest::Url::parse(&url).is_err() {
            return Err(ApiError::InvalidUrl(url));
        }

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        match self.store.get() {
            Ok(Some(token)) => headers.push(("Authorization".to_string(), format!("Bearer {token}"))),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored token, sending unauthenticated"),
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Send one request and decode the 2xx body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        parse_response(&response)
    }

    /// Send one request whose 2xx body, if any, is ignored.
    pub async fn request_empty(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<(), ApiError> {
        let response = self.send(method, path, body).await?;
        parse_empty(&response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(HttpMethod::Get, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(HttpMethod::Post, path, Some(encode(body)?)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(HttpMethod::Put, path, Some(encode(body)?)).await
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.request(HttpMethod::Patch, path, Some(encode(body)?)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request_empty(HttpMethod::Delete, path, None).await
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, body)?;
        log_request(&request);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => ApiError::Timeout,
                TransportError::Network(msg) => ApiError::NetworkError(msg),
            })?;
        log_response(&response);
        Ok(response)
    }
}

fn encode<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Classify `response` and decode a 2xx body as `T`.
pub fn parse_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    if response.body.is_empty() {
        return Err(ApiError::NoData);
    }
    serde_json::from_slice(&response.body).map_err(|e| ApiError::DecodingError(e.to_string()))
}

/// Classify `response`, accepting any 2xx regardless of body.
pub fn parse_empty(response: &HttpResponse) -> Result<(), ApiError> {
    check_status(response)
}

/// Map a status code to success or the matching `ApiError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200..=299 => Ok(()),
        401 => Err(ApiError::Unauthorized),
        403 => Err(ApiError::Forbidden),
        404 => Err(ApiError::NotFound),
        status @ (400..=499 | 500..=599) => Err(ApiError::ServerError {
            status,
            message: extract_message(&response.body),
        }),
        other => Err(ApiError::Unknown(other)),
    }
}

/// Prefer the envelope's `message`; fall back to the raw body text.
fn extract_message(body: &[u8]) -> Option<String> {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return Some(envelope.message);
    }
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}

/// JSON members whose values never reach the log.
const SECRET_FIELDS: [&str; 3] = ["password", "newPassword", "token"];

fn log_request(request: &HttpRequest) {
    if !cfg!(debug_assertions) {
        return;
    }
    // Header names only: the Authorization value is a credential.
    let header_names: Vec<&str> = request.headers.iter().map(|(k, _)| k.as_str()).collect();
    debug!(
        method = %request.method,
        url = %request.url,
        headers = ?header_names,
        body = %redacted(request.body.as_deref().unwrap_or("")),
        "sending request"
    );
}

fn log_response(response: &HttpResponse) {
    if !cfg!(debug_assertions) {
        return;
    }
    debug!(status = response.status, body = %redacted(&response.text()), "received response");
}

/// `body` with secret members of a top-level JSON object masked. Anything
/// else is returned unchanged.
fn redacted(body: &str) -> String {
    let Ok(serde_json::Value::Object(mut fields)) = serde_json::from_str(body) else {
        return body.to_string();
    };
    for name in SECRET_FIELDS {
        if let Some(value) = fields.get_mut(name) {
            *value = serde_json::Value::from("***");
        }
    }
    serde_json::Value::Object(fields).to_string()
}
