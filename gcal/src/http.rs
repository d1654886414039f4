// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and error mapping.

use reqwest::{Client, Method, RequestBuilder, Response};

use crate::config::{AuthMethod, GcalConfig};
use crate::error::GcalError;

/// HTTP client for API operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: GcalConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: GcalConfig) -> Result<Self, GcalError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.client.request(method, url);

        match &self.config.auth {
            AuthMethod::Bearer { token } => req.bearer_auth(token),
            AuthMethod::None => req,
        }
    }

    /// Executes a request and maps non-success statuses to [`GcalError::Api`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute(&self, req: RequestBuilder) -> Result<Response, GcalError> {
        let resp = req.send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response".to_string());
        tracing::debug!(status = status.as_u16(), body = %text, "request failed");
        Err(GcalError::from_response(status.as_u16(), &text))
    }

    /// Executes a request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not the expected JSON.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, GcalError> {
        let resp = self.execute(req).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| GcalError::Decode(e.to_string()))
    }
}
