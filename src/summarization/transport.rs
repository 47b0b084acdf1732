//! HTTP transports for the Gemini `generateContent` endpoint.
//!
//! Two call protocols exist. A credential shaped like a Google API key is sent as the `key`
//! query parameter straight to the public endpoint. Anything else is treated as a managed-client
//! token and sent as a bearer header; with no credential at all the request goes out
//! unauthenticated, for gateways that inject their own.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::sync::{Arc, LazyLock};

use super::error::{CandidateError, CandidateErrorKind};
use crate::config::Config;

static API_KEY_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^AIza[0-9A-Za-z_-]{35}$").expect("api key pattern is valid")
});

/// Call protocol selected from the credential shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// API key in the query string.
    DirectApiKey,
    /// Bearer token (or ambient credentials) through a client-style call.
    ManagedClient,
}

impl TransportMode {
    /// Pick the protocol for `credential`.
    pub fn detect(credential: Option<&str>) -> Self {
        match credential {
            Some(value) if API_KEY_SHAPE.is_match(value) => Self::DirectApiKey,
            _ => Self::ManagedClient,
        }
    }

    /// Label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectApiKey => "direct_api_key",
            Self::ManagedClient => "managed_client",
        }
    }
}

/// A way of sending one prompt to one model.
#[async_trait]
pub trait GenerativeTransport: Send + Sync {
    /// Protocol implemented by this transport.
    fn mode(&self) -> TransportMode;

    /// Send `prompt` to `model` and return the decoded response body.
    ///
    /// Bodies that are not JSON come back as [`Value::String`].
    async fn generate(&self, model: &str, prompt: &str) -> Result<Value, CandidateError>;
}

/// Build the transport matching the configured credential.
pub fn build_transport(config: &Config) -> Result<Arc<dyn GenerativeTransport>, reqwest::Error> {
    let http = Client::builder().user_agent("docbrief/generate").build()?;
    let base_url = config.gemini_base_url.clone();
    let credential = config.gemini_api_key.clone();

    let transport: Arc<dyn GenerativeTransport> =
        match TransportMode::detect(credential.as_deref()) {
            TransportMode::DirectApiKey => Arc::new(ApiKeyTransport {
                http,
                base_url,
                api_key: credential.unwrap_or_default(),
            }),
            TransportMode::ManagedClient => Arc::new(ManagedClientTransport {
                http,
                base_url,
                token: credential,
            }),
        };
    tracing::info!(mode = transport.mode().as_str(), "Configured generative transport");
    Ok(transport)
}

/// Direct HTTPS calls authenticated with an API key.
pub struct ApiKeyTransport {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ApiKeyTransport {
    /// Create a transport against `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl GenerativeTransport for ApiKeyTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::DirectApiKey
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Value, CandidateError> {
        let request = self
            .http
            .post(endpoint(&self.base_url, model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body(prompt));
        send(request, model).await
    }
}

/// Client-style calls authenticated with a bearer token, or not at all.
pub struct ManagedClientTransport {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ManagedClientTransport {
    /// Create a transport against `base_url`.
    pub fn new(http: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token,
        }
    }
}

#[async_trait]
impl GenerativeTransport for ManagedClientTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::ManagedClient
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<Value, CandidateError> {
        let mut request = self
            .http
            .post(endpoint(&self.base_url, model))
            .json(&request_body(prompt));
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }
        send(request, model).await
    }
}

fn endpoint(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{model}:generateContent",
        base_url.trim_end_matches('/')
    )
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }]
    })
}

async fn send(request: RequestBuilder, model: &str) -> Result<Value, CandidateError> {
    let response = request.send().await.map_err(|error| {
        CandidateError::new(
            model,
            CandidateErrorKind::Transport,
            format!("request failed: {}", error.without_url()),
        )
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|error| {
        CandidateError::new(
            model,
            CandidateErrorKind::Decode,
            format!("failed to read response body: {}", error.without_url()),
        )
    })?;

    if !status.is_success() {
        return Err(CandidateError::from_status(model, status.as_u16(), &body));
    }

    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}
