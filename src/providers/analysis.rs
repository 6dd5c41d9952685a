use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::http::ServiceClient;
use super::{AnalysisMode, AnalysisService, SessionContext};
use crate::errors::{PipelineError, ProviderError, Stage};

/// Analysis request body
#[derive(Debug, Serialize)]
pub struct AnalysisRequest<'a> {
    /// Extracted document text
    pub text: &'a str,
}

/// Analysis response body
#[derive(Debug, Deserialize)]
pub struct AnalysisResponse {
    /// Raw markup produced by the service
    pub content: String,
}

/// Client for the format-analysis service
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: ServiceClient,
}

impl AnalysisClient {
    /// Create a client for the service at `endpoint`
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: ServiceClient::new(endpoint, timeout)?,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.http = self.http.with_api_key(api_key);
        self
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.http = self.http.with_session(session);
        self
    }

    /// Path of the endpoint serving `mode`
    pub fn path_for(mode: AnalysisMode) -> String {
        format!("analysis/{}", mode.as_str())
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn analyze(&self, text: &str, mode: AnalysisMode) -> Result<String, PipelineError> {
        debug!("Requesting {} analysis of {} characters", mode, text.chars().count());

        let response: AnalysisResponse = self
            .http
            .post_json(&Self::path_for(mode), &AnalysisRequest { text })
            .await
            .map_err(|e| PipelineError::from_provider(Stage::Analyze, e))?;

        Ok(response.content)
    }
}
