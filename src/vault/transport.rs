//! # Vault Transport
//!
//! HTTP transport to the secrets backend. The reconciliation driver only
//! sees the [`VaultTransport`] trait, so tests substitute an in-memory
//! implementation and the driver stays free of HTTP concerns.

use crate::vault::payload::BackendPayload;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

/// Transport failure talking to the backend.
///
/// Retryable by the caller (the controller runtime requeues with backoff);
/// the driver itself never retries.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("backend rejected request at '{path}': status {status}")]
    Rejected { path: String, status: u16 },
    #[error("backend response at '{path}' is not a JSON object")]
    MalformedResponse { path: String },
}

/// Read/write access to backend state at a canonical path.
///
/// "Not found" is a valid read outcome, not an error: a path that has never
/// been written reads as `None` and reconciles as an initial create.
#[async_trait]
pub trait VaultTransport: Send + Sync {
    /// Fetch the payload stored at `path`. `Ok(None)` means not found.
    async fn read_payload(&self, path: &str) -> Result<Option<BackendPayload>, TransportError>;

    /// Store `payload` at `path`, replacing whatever is there.
    async fn write_payload(
        &self,
        path: &str,
        payload: &BackendPayload,
    ) -> Result<(), TransportError>;
}

/// Production transport over the Vault HTTP API.
///
/// Reads `GET {addr}/v1/{path}` (unwrapping the `data` envelope), writes
/// `POST {addr}/v1/{path}`, authenticating with the `X-Vault-Token` header.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    token: String,
}

impl VaultClient {
    pub fn new(address: &str, token: &str) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            address: address.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path)
    }
}

#[async_trait]
impl VaultTransport for VaultClient {
    async fn read_payload(&self, path: &str) -> Result<Option<BackendPayload>, TransportError> {
        let response = self
            .http
            .get(self.url(path))
            .header("X-Vault-Token", &self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path = %path, "backend path not found, treating as empty actual state");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TransportError::Rejected {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        // Vault wraps the stored fields in a `data` envelope
        let data = body
            .get("data")
            .and_then(|d| d.as_object())
            .ok_or_else(|| TransportError::MalformedResponse {
                path: path.to_string(),
            })?;
        Ok(Some(BackendPayload::from_json_map(data)))
    }

    async fn write_payload(
        &self,
        path: &str,
        payload: &BackendPayload,
    ) -> Result<(), TransportError> {
        let response = self
            .http
            .post(self.url(path))
            .header("X-Vault-Token", &self.token)
            .json(&serde_json::Value::Object(payload.to_json_map()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Rejected {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        debug!(path = %path, "wrote desired payload to backend");
        Ok(())
    }
}
