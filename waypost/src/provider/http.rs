//! HTTP client abstraction for testability

use std::time::Duration;

use super::types::{BoxFuture, ProviderError};

/// Default request timeout. Timeouts surface as [`ProviderError::Network`].
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A raw HTTP response: status code plus body bytes.
///
/// Status classification is left to the providers, which know which codes
/// mean "rate limited" versus "no route" for their service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing by
/// enabling mock HTTP clients in tests. Only transport-level failures are
/// errors here; a response with any status code is an `Ok`.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, ProviderError>>;

    /// Performs an HTTP POST with a JSON body and optional authorization.
    fn post_json(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, ProviderError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a new ReqwestClient with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse, ProviderError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to read response: {}", e)))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, ProviderError>> {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| ProviderError::Network(format!("request failed: {}", e)))?;
            Self::read_response(response).await
        })
    }

    fn post_json(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, ProviderError>> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(token) = authorization {
            request = request.header("Authorization", token);
        }
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| ProviderError::Network(format!("request failed: {}", e)))?;
            Self::read_response(response).await
        })
    }
}
