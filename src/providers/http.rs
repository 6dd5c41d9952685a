use std::fmt;
use std::time::Duration;

use log::{debug, error};
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::SessionContext;
use crate::errors::ProviderError;

/// Header carrying a per-service API key
pub const API_KEY_HEADER: &str = "api-subscription-key";

/// JSON-over-HTTP client shared by the service clients
#[derive(Clone)]
pub struct ServiceClient {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, always ending with a slash so relative paths append
    base_url: Url,
    /// API key sent with every request
    api_key: Option<String>,
    /// Identity forwarded as a bearer token
    session: SessionContext,
}

impl ServiceClient {
    /// Create a client for the service rooted at `endpoint`
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let mut normalized = endpoint.trim().trim_end_matches('/').to_string();
        normalized.push('/');
        let base_url = Url::parse(&normalized).map_err(|e| {
            ProviderError::RequestFailed(format!("Invalid service endpoint '{}': {}", endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: None,
            session: SessionContext::anonymous(),
        })
    }

    /// Send an API key with every request; empty keys are ignored
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    /// Forward the session identity with every request
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of a path relative to the base
    pub fn url(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid request path '{}': {}", path, e)))
    }

    /// POST `body` as JSON to `path` and decode the JSON answer
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let mut request = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }
        if let Some(token) = self.session.identity_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Service error from {} ({}): {}", url, status, error_text);
            return Err(status_error(status, error_text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Invalid response from {}: {}", url, e)))
    }
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("session", &self.session)
            .finish()
    }
}

/// Map a non-success status to the matching provider error
fn status_error(status: StatusCode, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthenticationError(format!("{} - {}", status.as_u16(), message))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::RateLimitExceeded(format!("{} - {}", status.as_u16(), message))
        }
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        },
    }
}
