//! HTTP replica client
//!
//! Speaks the catalog HTTP surface: `GET /info/{id}` for reads,
//! `PUT /updateCount/{id}` with `{"count": n}` for propagation, and
//! `GET /health` as the probe. Non-success statuses map onto the error
//! taxonomy: 404 is the item rejection, 400 a validation rejection, 5xx
//! and transport failures are transient.

use async_trait::async_trait;
use bazar_core::{BazarError, BazarResult, CatalogItem, ItemId, ReplicaError, StoreError, ValidationError};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

use super::{ReplicaAck, ReplicaLink};

#[derive(Serialize)]
struct UpdateCountBody {
    count: i64,
}

/// `ReplicaLink` implementation over HTTP.
pub struct HttpReplicaLink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReplicaLink {
    /// Create a client for the replica at `base_url`.
    ///
    /// The timeout applies to connecting and to each whole request; the
    /// coordinator layers its own deadline on top.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BazarResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                BazarError::from(ReplicaError::Unreachable {
                    endpoint: base_url.clone(),
                    reason: format!("failed to build HTTP client: {}", e),
                })
            })?;

        Ok(Self { client, base_url })
    }

    fn transport_error(&self, err: reqwest::Error) -> BazarError {
        if err.is_timeout() {
            ReplicaError::Timeout {
                endpoint: self.base_url.clone(),
            }
            .into()
        } else {
            ReplicaError::Unreachable {
                endpoint: self.base_url.clone(),
                reason: err.to_string(),
            }
            .into()
        }
    }

    /// Map a non-success response onto the error taxonomy.
    ///
    /// `id` is the item the request was about, when there is one; it turns
    /// a 404 into the typed not-found rejection.
    async fn status_error(&self, id: Option<ItemId>, response: reqwest::Response) -> BazarError {
        let status = response.status();
        let reason = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return StoreError::NotFound { id }.into();
            }
        }

        if status == StatusCode::BAD_REQUEST {
            return ValidationError::InvalidValue {
                field: "request".to_string(),
                reason,
            }
            .into();
        }

        if status.is_server_error() {
            return ReplicaError::Unreachable {
                endpoint: self.base_url.clone(),
                reason: format!("server error {}: {}", status.as_u16(), reason),
            }
            .into();
        }

        ReplicaError::BadResponse {
            endpoint: self.base_url.clone(),
            status: status.as_u16(),
            reason,
        }
        .into()
    }

    fn parse_error(&self, status: StatusCode, err: reqwest::Error) -> BazarError {
        ReplicaError::BadResponse {
            endpoint: self.base_url.clone(),
            status: status.as_u16(),
            reason: format!("failed to parse response body: {}", err),
        }
        .into()
    }
}

#[async_trait]
impl ReplicaLink for HttpReplicaLink {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn get_info(&self, id: ItemId) -> BazarResult<CatalogItem> {
        let url = format!("{}/info/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<CatalogItem>()
                .await
                .map_err(|e| self.parse_error(status, e))
        } else {
            Err(self.status_error(Some(id), response).await)
        }
    }

    async fn propagate_count(&self, id: ItemId, count: i64) -> BazarResult<ReplicaAck> {
        let url = format!("{}/updateCount/{}", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .json(&UpdateCountBody { count })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<ReplicaAck>()
                .await
                .map_err(|e| self.parse_error(status, e))
        } else {
            Err(self.status_error(Some(id), response).await)
        }
    }

    async fn ping(&self) -> BazarResult<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.status_error(None, response).await)
        }
    }
}

impl std::fmt::Debug for HttpReplicaLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReplicaLink")
            .field("base_url", &self.base_url)
            .finish()
    }
}
