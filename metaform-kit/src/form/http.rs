//! HTTP Collaborator
//!
//! The engine only ever POSTs a JSON body and reads a JSON answer back. The
//! [`HttpClient`] trait is that single capability; [`ReqwestHttpClient`] is
//! the default implementation.

use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde_json::Value;
use url::Url;

use super::config::FormConfig;
use super::error::{FormError, Result};

/// The one HTTP capability the engine needs.
pub trait HttpClient {
    /// POST `body` as JSON to `url` and decode the JSON response
    fn post(&self, url: &str, body: Value) -> LocalBoxFuture<'static, Result<Value>>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    base_url: Option<Url>,
    auth_token: Option<String>,
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestHttpClient {
    /// Create a new client with default settings
    pub fn new() -> Self {
        ReqwestHttpClient {
            client: reqwest::Client::new(),
            base_url: None,
            auth_token: None,
        }
    }

    /// Create a client from the engine configuration
    pub fn from_config(config: &FormConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| FormError::Config(format!("failed to build HTTP client: {e}")))?;

        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| FormError::Config(format!("invalid baseUrl: {e}")))?;

        Ok(ReqwestHttpClient {
            client,
            base_url,
            auth_token: None,
        })
    }

    /// Set the base URL relative option sources are joined onto
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set authentication token
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Resolve `url` against the base URL, if any
    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| FormError::Http {
            url: url.to_string(),
            message: format!("invalid URL: {e}"),
        })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn post(&self, url: &str, body: Value) -> LocalBoxFuture<'static, Result<Value>> {
        send_post(
            self.client.clone(),
            self.resolve_url(url),
            self.auth_token.clone(),
            body,
        )
        .boxed_local()
    }
}

/// Make a JSON POST and decode the JSON answer.
async fn send_post(
    client: reqwest::Client,
    url: Result<Url>,
    auth_token: Option<String>,
    body: Value,
) -> Result<Value> {
    let url = url?;
    let url_text = url.to_string();

    let mut request = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(&body);
    if let Some(token) = &auth_token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }

    let response = request.send().await.map_err(|e| FormError::Http {
        url: url_text.clone(),
        message: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(FormError::Status {
            url: url_text,
            status: response.status().as_u16(),
        });
    }

    let text = response.text().await.map_err(|e| FormError::Http {
        url: url_text.clone(),
        message: format!("failed to read response body: {e}"),
    })?;

    ::log::debug!("[http] {} answered with {} bytes", url_text, text.len());

    serde_json::from_str(&text).map_err(|e| FormError::decode("response body", e))
}
