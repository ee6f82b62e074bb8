//! reqwest-backed transport

use crate::{
    config::ClientConfig,
    error::TransportError,
    http::{ApiRequest, ApiResponse, HttpTransport},
};
use async_trait::async_trait;
use reqwest::Client;

/// Transport issuing HTTPS requests with reqwest
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport with the configured base URL, timeout and user agent
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.path)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(request);
        tracing::debug!(url = %url, query = ?request.query, "Sending market data request");

        let response = self
            .client
            .get(&url)
            .query(&request.query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
