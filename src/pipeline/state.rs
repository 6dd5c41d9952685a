use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::errors::{PipelineError, Stage};
use crate::language_utils::TargetLanguage;
use crate::playback::PlaybackHandle;
use crate::providers::AnalysisMode;

/// Stage and message of a recorded failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub stage: Stage,
    pub message: String,
}

impl From<&PipelineError> for ErrorDetail {
    fn from(error: &PipelineError) -> Self {
        Self {
            stage: error.stage(),
            message: error.message(),
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Primary state of a pipeline instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// No document selected yet
    #[default]
    Idle,
    /// A document is selected and its text is being extracted
    Extracting,
    /// Text is extracted and an analysis request is in flight
    AnalysisPending,
    /// Analysis content is available
    AnalysisReady,
    /// Extraction or analysis failed
    Error(ErrorDetail),
}

impl PipelineState {
    /// Human readable name used in logs and `NotReady` errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::AnalysisPending => "waiting for analysis",
            Self::AnalysisReady => "ready",
            Self::Error(detail) if detail.stage == Stage::Extract => "failed to extract",
            Self::Error(_) => "failed to analyze",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::AnalysisReady)
    }

    /// Failure detail if the pipeline is in an error state
    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Error(detail) => Some(detail),
            _ => None,
        }
    }

    /// Whether the pipeline failed at `stage`
    pub fn failed_at(&self, stage: Stage) -> bool {
        self.error().is_some_and(|detail| detail.stage == stage)
    }
}

/// Tag minted for every request of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic token source of one stage
///
/// Only the most recently minted token is current; every result tagged with
/// an older token is stale.
#[derive(Debug, Default)]
pub struct TokenCounter {
    current: RequestToken,
}

impl TokenCounter {
    /// Mint a new token, superseding every earlier one
    pub fn advance(&mut self) -> RequestToken {
        self.current = RequestToken(self.current.0 + 1);
        self.current
    }

    pub fn current(&self) -> RequestToken {
        self.current
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current == token
    }
}

/// Outcome of a dispatched request, tagged with the request's token
#[derive(Debug)]
pub struct Completion<T> {
    pub token: RequestToken,
    pub result: Result<T, PipelineError>,
}

/// Whether a commit changed the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// The completion was current and its outcome was recorded
    Applied,
    /// The completion was superseded and dropped
    Stale,
}

/// Raw answer of the analysis service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub raw_content: String,
    pub mode: AnalysisMode,
    pub request_token: RequestToken,
}

/// Translation of the current formatted content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub translated_text: String,
    pub target_language: TargetLanguage,
    /// Analysis token of the content that was translated
    pub source_token: RequestToken,
}

/// Text a speech clip is synthesized from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SpeechSource {
    /// The formatted analysis content, spoken in English
    #[default]
    Content,
    /// The current translation, spoken in its target language
    Translation,
}

impl SpeechSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Translation => "translation",
        }
    }
}

/// Audio returned by the speech service, not yet installed for playback
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    pub audio: Bytes,
    pub language: TargetLanguage,
    pub source: SpeechSource,
}

/// Synthesized speech installed in the playback store
#[derive(Debug)]
pub struct SpeechClip {
    pub audio: Bytes,
    pub language: TargetLanguage,
    pub source: SpeechSource,
    pub handle: PlaybackHandle,
}
