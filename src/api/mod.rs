// src/api/mod.rs

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{auth::Session, error::ApiError, middleware::auth_header::authorize};

pub mod appointment_api;
pub mod auth_api;
pub mod availability_api;
pub mod clinic_api;
pub mod service_api;

/// Thin typed wrapper over the remote HTTP API.
///
/// Every method makes exactly one attempt. Non-2xx responses come back as
/// `ApiError::Http` with the raw body; transport failures as
/// `ApiError::Network`. Callers attach their own context.
#[derive(Clone, Debug)]
pub struct HttpApi {
    base_url: String,
    client: reqwest::Client,
    session: Session,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout_secs: u64, session: Session) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Network {
                context: "Failed to create HTTP client".into(),
                source: e,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send with auth + request id attached; map transport errors and
    /// non-success statuses.
    async fn send(&self, builder: RequestBuilder, label: &str) -> Result<Response, ApiError> {
        let (builder, request_id) = authorize(builder, &self.session);
        debug!(%request_id, request = label, "sending request");

        let response = builder.send().await.map_err(|e| ApiError::Network {
            context: format!("{label} failed"),
            source: e,
        })?;

        let status = response.status();
        debug!(%request_id, status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                context: label.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response, label: &str) -> Result<T, ApiError> {
        let text = response.text().await.map_err(|e| ApiError::Network {
            context: format!("{label} failed while reading the response"),
            source: e,
        })?;
        if text.trim().is_empty() || text.trim() == "null" {
            return Err(ApiError::EmptyBody(label.to_string()));
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{label}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let label = format!("GET {path}");
        let response = self.send(self.request(Method::GET, path), &label).await?;
        Self::read_json(response, &label).await
    }
}
