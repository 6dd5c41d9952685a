use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::http::ServiceClient;
use super::{MAX_PAYLOAD_CHARS, SessionContext, TranslationService, truncate_chars};
use crate::errors::{PipelineError, ProviderError, Stage};
use crate::language_utils::{SOURCE_LANGUAGE, TargetLanguage};

/// Translation path relative to the configured endpoint
const TRANSLATE_PATH: &str = "translate";

/// Translation request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    /// Text to translate, at most `MAX_PAYLOAD_CHARS` characters
    pub input: String,
    /// Always English
    pub source_language: String,
    /// Region-tagged target code, e.g. `hi-IN`
    pub target_language: String,
}

/// Translation response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    pub translated_text: String,
}

/// Client for the translation service
#[derive(Debug, Clone)]
pub struct TranslationClient {
    http: ServiceClient,
}

impl TranslationClient {
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

    /// Request body for `content`, truncated to the payload limit
    pub fn build_request(content: &str, target: TargetLanguage) -> TranslationRequest {
        TranslationRequest {
            input: truncate_chars(content, MAX_PAYLOAD_CHARS).to_string(),
            source_language: SOURCE_LANGUAGE.to_string(),
            target_language: target.code(),
        }
    }
}

#[async_trait]
impl TranslationService for TranslationClient {
    async fn translate(&self, content: &str, target: TargetLanguage) -> Result<String, PipelineError> {
        let request = Self::build_request(content, target);
        debug!(
            "Translating {} of {} characters into {}",
            request.input.chars().count(),
            content.chars().count(),
            request.target_language
        );

        let response: TranslationResponse = self
            .http
            .post_json(TRANSLATE_PATH, &request)
            .await
            .map_err(|e| PipelineError::from_provider(Stage::Translate, e))?;

        Ok(response.translated_text)
    }
}
