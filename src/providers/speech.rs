use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::http::ServiceClient;
use super::{MAX_PAYLOAD_CHARS, SessionContext, SpeechService, truncate_chars};
use crate::errors::{PipelineError, ProviderError, Stage};
use crate::language_utils::TargetLanguage;

/// Speech path relative to the configured endpoint
const SPEECH_PATH: &str = "speech";

/// Voice used when none is configured
pub const DEFAULT_SPEAKER: &str = "meera";

/// Speech request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    /// Text to speak, at most `MAX_PAYLOAD_CHARS` characters
    pub text: String,
    /// Region-tagged language code, e.g. `bn-IN`
    pub target_language: String,
    /// Voice name
    pub speaker: String,
}

/// Speech response body
#[derive(Debug, Deserialize)]
pub struct SpeechResponse {
    /// Base64 encoded mono audio
    pub audio: String,
}

/// Client for the speech synthesis service
#[derive(Debug, Clone)]
pub struct SpeechSynthesizer {
    http: ServiceClient,
    speaker: String,
}

impl SpeechSynthesizer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: ServiceClient::new(endpoint, timeout)?,
            speaker: DEFAULT_SPEAKER.to_string(),
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

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = speaker.into();
        self
    }

    /// Request body for `text`, truncated to the payload limit
    pub fn build_request(&self, text: &str, language: TargetLanguage) -> SpeechRequest {
        SpeechRequest {
            text: truncate_chars(text, MAX_PAYLOAD_CHARS).to_string(),
            target_language: language.code(),
            speaker: self.speaker.clone(),
        }
    }
}

/// Decode the base64 audio payload of a speech response
pub fn decode_audio(payload: &str) -> Result<Bytes, PipelineError> {
    let audio = STANDARD.decode(payload.trim()).map_err(|e| {
        error!("Undecodable audio payload: {}", e);
        PipelineError::SpeechService(format!("Invalid audio payload: {}", e))
    })?;

    if audio.is_empty() {
        return Err(PipelineError::SpeechService("Empty audio payload".to_string()));
    }

    Ok(Bytes::from(audio))
}

#[async_trait]
impl SpeechService for SpeechSynthesizer {
    async fn synthesize(&self, text: &str, language: TargetLanguage) -> Result<Bytes, PipelineError> {
        let request = self.build_request(text, language);
        debug!(
            "Synthesizing {} characters in {} with voice {}",
            request.text.chars().count(),
            request.target_language,
            request.speaker
        );

        let response: SpeechResponse = self
            .http
            .post_json(SPEECH_PATH, &request)
            .await
            .map_err(|e| PipelineError::from_provider(Stage::Speech, e))?;

        decode_audio(&response.audio)
    }
}
