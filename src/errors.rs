/*!
 * Error types for the legaldoc pipeline.
 *
 * This module contains the error taxonomy of the document pipeline, the
 * transport-level errors raised by the remote service clients, and the
 * application error used by the command-line front end. All of them are
 * defined with the thiserror crate.
 */

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage an error or artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Text extraction from the source document
    Extract,
    /// Remote analysis of the extracted text
    Analyze,
    /// Translation of the formatted content
    Translate,
    /// Speech synthesis
    Speech,
}

impl Stage {
    /// Lowercase stage name used in logs and error affordances
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Analyze => "analyze",
            Self::Translate => "translate",
            Self::Speech => "speech",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to a remote service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the failure happened below the HTTP layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::RequestFailed(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by the document pipeline, one variant family per stage
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The declared document format is not one of the supported formats
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document bytes could not be decoded
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// The analysis service rejected the request or answered garbage
    #[error("Analysis service error: {0}")]
    AnalysisService(String),

    /// The translation service rejected the request or answered garbage
    #[error("Translation service error: {0}")]
    TranslationService(String),

    /// The speech service rejected the request or answered garbage
    #[error("Speech service error: {0}")]
    SpeechService(String),

    /// Transport-level failure while talking to a stage's service
    #[error("Network error during {stage}: {message}")]
    Network {
        /// Stage whose call failed
        stage: Stage,
        /// Underlying transport message
        message: String,
    },

    /// The operation is not permitted in the controller's current state
    #[error("Cannot run {stage} while the pipeline is {state}")]
    NotReady {
        /// Stage the caller asked for
        stage: Stage,
        /// Name of the state the controller was in
        state: &'static str,
    },
}

impl PipelineError {
    /// Map a transport error into the taxonomy for the given stage
    pub fn from_provider(stage: Stage, error: ProviderError) -> Self {
        if error.is_transport() {
            return Self::Network {
                stage,
                message: error.to_string(),
            };
        }

        let message = error.to_string();
        match stage {
            Stage::Extract => Self::Parse(message),
            Stage::Analyze => Self::AnalysisService(message),
            Stage::Translate => Self::TranslationService(message),
            Stage::Speech => Self::SpeechService(message),
        }
    }

    /// Stage the error is attributed to
    pub fn stage(&self) -> Stage {
        match self {
            Self::UnsupportedFormat(_) | Self::Parse(_) => Stage::Extract,
            Self::AnalysisService(_) => Stage::Analyze,
            Self::TranslationService(_) => Stage::Translate,
            Self::SpeechService(_) => Stage::Speech,
            Self::Network { stage, .. } | Self::NotReady { stage, .. } => *stage,
        }
    }

    /// Underlying message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::UnsupportedFormat(m)
            | Self::Parse(m)
            | Self::AnalysisService(m)
            | Self::TranslationService(m)
            | Self::SpeechService(m) => m.clone(),
            Self::Network { message, .. } => message.clone(),
            Self::NotReady { .. } => self.to_string(),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error in the configuration file or overrides
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the document pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
