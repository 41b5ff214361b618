//! The network seam between the session controller and the chat service.
//!
//! [`ChatBackend`] is what the controller talks to; [`HttpBackend`] is the
//! reqwest implementation against the REST contract:
//!
//! | call              | request                          | success body                      |
//! |-------------------|----------------------------------|-----------------------------------|
//! | `fetch_personas`  | `GET {base}/`                    | `{"available_personas": [...]}`   |
//! | `send_chat`       | `POST {base}/chat`               | `{"response": "..."}`             |
//! | `download_logs`   | `GET {base}/download-logs?secret`| raw file bytes                    |

use std::future::Future;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::directory::PersonaSet;
use crate::error::{DirectoryError, LogDownloadError, SendFailure};
use crate::protocol::{ChatReply, ChatRequest, DirectoryResponse};

/// Operations the controller and log exporter need from the chat service.
///
/// Every failure is returned as a value; implementations never panic.
pub trait ChatBackend: Send + Sync {
    fn fetch_personas(&self) -> impl Future<Output = Result<PersonaSet, DirectoryError>> + Send;

    /// Send one chat turn and return the reply text.
    fn send_chat(&self, request: &ChatRequest) -> impl Future<Output = Result<String, SendFailure>> + Send;

    fn download_logs(&self, secret: &str) -> impl Future<Output = Result<Vec<u8>, LogDownloadError>> + Send;
}

/// [`ChatBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        // Builder failure only happens when the TLS backend cannot start;
        // fall back to the default client rather than panicking.
        let client = builder.build().unwrap_or_default();
        Self { config, client }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ChatBackend for HttpBackend {
    /// # Returns
    /// - `Ok(set)` on a 2xx JSON body; a missing `available_personas` field
    ///   gives an empty set.
    /// - `Err(DirectoryError::Network)` when the request could not be sent.
    /// - `Err(DirectoryError::Http)` on a non-2xx status.
    /// - `Err(DirectoryError::Malformed)` when the body is not the expected JSON.
    async fn fetch_personas(&self) -> Result<PersonaSet, DirectoryError> {
        let url = self.config.endpoint("/");
        let resp = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, url = %url, "persona directory request failed");
            DirectoryError::Network { detail: e.to_string() }
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "persona directory returned an error status");
            return Err(DirectoryError::Http { status: status.as_u16() });
        }

        let bytes = resp.bytes().await.map_err(|e| DirectoryError::Network {
            detail: e.to_string(),
        })?;
        let body: DirectoryResponse = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, url = %url, "persona directory body did not parse");
            DirectoryError::Malformed { detail: e.to_string() }
        })?;

        debug!(count = body.available_personas.len(), "persona directory loaded");
        Ok(PersonaSet::new(body.available_personas))
    }

    /// # Returns
    /// - `Ok(reply)` on a 2xx body with a string `response` and no error field.
    /// - `Err(SendFailure::Network)` when the request could not be sent or
    ///   the body could not be read.
    /// - `Err(SendFailure::Http)` on a non-2xx status, with the body's
    ///   `detail`/`error` text when present.
    /// - `Err(SendFailure::Backend)` on a 2xx body carrying `detail`/`error`.
    /// - `Err(SendFailure::Malformed)` when the body is not JSON or lacks
    ///   `response`.
    async fn send_chat(&self, request: &ChatRequest) -> Result<String, SendFailure> {
        let url = self.config.endpoint("/chat");
        let resp = self.client.post(&url).json(request).send().await.map_err(|e| {
            warn!(error = %e, url = %url, "chat request failed");
            SendFailure::Network { detail: e.to_string() }
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| SendFailure::Network {
            detail: e.to_string(),
        })?;
        let parsed = serde_json::from_slice::<ChatReply>(&bytes);

        if !status.is_success() {
            let detail = match &parsed {
                Ok(reply) => reply.error_text(),
                Err(_) => None,
            };
            warn!(status = status.as_u16(), url = %url, "chat request returned an error status");
            return Err(SendFailure::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let reply = parsed.map_err(|e| {
            warn!(error = %e, url = %url, "chat reply did not parse");
            SendFailure::Malformed { detail: e.to_string() }
        })?;

        if let Some(detail) = reply.error_text() {
            warn!(detail = %detail, "backend reported an application error");
            return Err(SendFailure::Backend { detail });
        }

        reply.response.ok_or_else(|| SendFailure::Malformed {
            detail: "missing `response` field".to_string(),
        })
    }

    /// The secret is sent as the `secret` query parameter, URL-encoded.
    async fn download_logs(&self, secret: &str) -> Result<Vec<u8>, LogDownloadError> {
        let url = self.config.endpoint("/download-logs");
        let resp = self
            .client
            .get(&url)
            .query(&[("secret", secret)])
            .send()
            .await
            .map_err(|e| LogDownloadError::Network { detail: e.to_string() })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LogDownloadError::Http { status: status.as_u16() });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LogDownloadError::Network { detail: e.to_string() })?;
        Ok(bytes.to_vec())
    }
}
