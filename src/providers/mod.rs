/*!
 * Clients for the remote services used by the pipeline.
 *
 * Each stage talks to its service through a trait, so the controller can be
 * driven by the HTTP clients in production and by the mocks in tests:
 * - `AnalysisService`: analysis service (`analysis`) or chat completions (`chat`)
 * - `TranslationService`: translation service (`translation`)
 * - `SpeechService`: speech synthesis service (`speech`)
 *
 * Clients are stateless; staleness and invalidation are the controller's job.
 */

use std::fmt::{self, Debug};
use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::language_utils::TargetLanguage;

pub mod analysis;
pub mod chat;
pub mod http;
pub mod mock;
pub mod speech;
pub mod translation;

pub use self::analysis::AnalysisClient;
pub use self::chat::ChatAnalysisClient;
pub use self::speech::SpeechSynthesizer;
pub use self::translation::TranslationClient;

/// Longest text, in characters, sent to the translation and speech services
pub const MAX_PAYLOAD_CHARS: usize = 1000;

/// Analysis flavour requested from the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Short summary of the document
    #[default]
    Summarize,
    /// Detailed sectioned analysis
    Analyze,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Analyze => "analyze",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "summarize" | "summary" => Ok(Self::Summarize),
            "analyze" | "analysis" => Ok(Self::Analyze),
            _ => Err(anyhow!("Unknown analysis mode: {}", s)),
        }
    }
}

/// Opaque identity of the signed-in user, forwarded to the services
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    identity_token: Option<String>,
}

impl SessionContext {
    /// Session without an identity
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            identity_token: Some(token.into()),
        }
    }

    pub fn identity_token(&self) -> Option<&str> {
        self.identity_token.as_deref()
    }
}

impl Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself.
        f.debug_struct("SessionContext")
            .field("authenticated", &self.identity_token.is_some())
            .finish()
    }
}

/// Remote analysis of extracted document text
#[async_trait]
pub trait AnalysisService: Send + Sync + Debug {
    /// Analyze `text` under `mode` and return the raw markup produced
    async fn analyze(&self, text: &str, mode: AnalysisMode) -> Result<String, PipelineError>;
}

/// Remote translation of formatted content
#[async_trait]
pub trait TranslationService: Send + Sync + Debug {
    /// Translate `content` from English into `target`
    ///
    /// Implementations send at most `MAX_PAYLOAD_CHARS` characters.
    async fn translate(&self, content: &str, target: TargetLanguage) -> Result<String, PipelineError>;
}

/// Remote text-to-speech
#[async_trait]
pub trait SpeechService: Send + Sync + Debug {
    /// Synthesize `text` spoken in `language` and return the decoded audio
    ///
    /// Implementations send at most `MAX_PAYLOAD_CHARS` characters.
    async fn synthesize(&self, text: &str, language: TargetLanguage) -> Result<Bytes, PipelineError>;
}

/// Longest prefix of `text` holding at most `max_chars` characters
///
/// Counts Unicode scalar values, so a code point is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
