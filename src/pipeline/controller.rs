/*!
 * The pipeline state machine.
 *
 * `PipelineController` owns the current document, mode and language, the
 * cached extracted text and every derived artifact. Remote stages are split
 * in three steps so that several requests can be in flight while the
 * controller stays the single owner of its state:
 *
 * 1. `request_*` (`&mut self`) mints a token and returns a ticket
 * 2. `dispatch_*` (`&self`) turns the ticket into a `'static` future that
 *    only holds the service handles, never the controller
 * 3. `commit_*` (`&mut self`) applies the tagged completion if its token is
 *    still current and drops it otherwise
 *
 * Derived artifacts form the chain formatted content → translation → speech;
 * invalidating one link clears everything after it.
 */

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, info, warn};

use super::state::{
    AnalysisResult, CommitStatus, Completion, ErrorDetail, PipelineState, RequestToken, SpeechClip,
    SpeechSource, SynthesizedSpeech, TokenCounter, TranslationResult,
};
use crate::content::{ContentFormatter, FormattedContent};
use crate::errors::{PipelineError, Stage};
use crate::extraction::{ExtractedText, FormatExtractor, SourceDocument};
use crate::language_utils::TargetLanguage;
use crate::playback::PlaybackStore;
use crate::providers::{AnalysisMode, AnalysisService, SpeechService, TranslationService};

/// Service handles the controller dispatches to
#[derive(Debug, Clone)]
pub struct PipelineServices {
    pub analysis: Arc<dyn AnalysisService>,
    pub translation: Arc<dyn TranslationService>,
    pub speech: Arc<dyn SpeechService>,
    pub playback: Arc<dyn PlaybackStore>,
}

/// Pending analysis request
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub token: RequestToken,
    pub mode: AnalysisMode,
    pub text: Arc<ExtractedText>,
}

/// Pending translation request
#[derive(Debug, Clone)]
pub struct TranslationTicket {
    pub token: RequestToken,
    pub content: String,
    pub target: TargetLanguage,
    /// Analysis token of the content being translated
    pub source_token: RequestToken,
}

/// Pending speech request
#[derive(Debug, Clone)]
pub struct SpeechTicket {
    pub token: RequestToken,
    pub text: String,
    pub language: TargetLanguage,
    pub source: SpeechSource,
}

/// Orchestrates extraction, analysis, translation and speech for one session
#[derive(Debug)]
pub struct PipelineController {
    services: PipelineServices,
    extractor: FormatExtractor,
    formatter: ContentFormatter,

    state: PipelineState,
    mode: AnalysisMode,
    language: TargetLanguage,

    document: Option<SourceDocument>,
    extracted: Option<Arc<ExtractedText>>,
    analysis: Option<AnalysisResult>,
    formatted: Option<FormattedContent>,
    translation: Option<TranslationResult>,
    translation_error: Option<ErrorDetail>,
    speech: Option<SpeechClip>,
    speech_error: Option<ErrorDetail>,

    analysis_tokens: TokenCounter,
    translation_tokens: TokenCounter,
    speech_tokens: TokenCounter,
}

impl PipelineController {
    pub fn new(services: PipelineServices) -> Self {
        Self {
            services,
            extractor: FormatExtractor::new(),
            formatter: ContentFormatter::new(),
            state: PipelineState::Idle,
            mode: AnalysisMode::default(),
            language: TargetLanguage::default(),
            document: None,
            extracted: None,
            analysis: None,
            formatted: None,
            translation: None,
            translation_error: None,
            speech: None,
            speech_error: None,
            analysis_tokens: TokenCounter::default(),
            translation_tokens: TokenCounter::default(),
            speech_tokens: TokenCounter::default(),
        }
    }

    /// Start with `mode` instead of the default
    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    /// Start with `language` instead of the default
    pub fn with_language(mut self, language: TargetLanguage) -> Self {
        self.language = language;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn language(&self) -> TargetLanguage {
        self.language
    }

    /// Document selected and not yet extracted
    pub fn document(&self) -> Option<&SourceDocument> {
        self.document.as_ref()
    }

    pub fn extracted_text(&self) -> Option<&ExtractedText> {
        self.extracted.as_deref()
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn formatted_content(&self) -> Option<&FormattedContent> {
        self.formatted.as_ref()
    }

    pub fn translation(&self) -> Option<&TranslationResult> {
        self.translation.as_ref()
    }

    pub fn translation_error(&self) -> Option<&ErrorDetail> {
        self.translation_error.as_ref()
    }

    pub fn speech_clip(&self) -> Option<&SpeechClip> {
        self.speech.as_ref()
    }

    pub fn speech_error(&self) -> Option<&ErrorDetail> {
        self.speech_error.as_ref()
    }

    pub fn analysis_token(&self) -> RequestToken {
        self.analysis_tokens.current()
    }

    pub fn translation_token(&self) -> RequestToken {
        self.translation_tokens.current()
    }

    pub fn speech_token(&self) -> RequestToken {
        self.speech_tokens.current()
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    fn clear_speech(&mut self) {
        self.speech_tokens.advance();
        self.speech_error = None;
        if let Some(clip) = self.speech.take() {
            debug!("Releasing speech clip {}", clip.handle.id());
            self.services.playback.revoke(clip.handle);
        }
    }

    fn clear_translation(&mut self) {
        self.translation_tokens.advance();
        self.translation = None;
        self.translation_error = None;
        self.clear_speech();
    }

    fn clear_analysis(&mut self) {
        self.analysis = None;
        self.formatted = None;
        self.clear_translation();
    }

    fn not_ready(&self, stage: Stage) -> PipelineError {
        PipelineError::NotReady {
            stage,
            state: self.state.name(),
        }
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// Select a new document, resetting every artifact
    ///
    /// Accepted in every state. Any in-flight request of any stage becomes
    /// stale and a loaded speech clip is released immediately.
    pub fn select_file(&mut self, document: SourceDocument) {
        info!(
            "Selected document {} ({}, {} bytes)",
            document.name().unwrap_or("unnamed"),
            document.declared_format(),
            document.len()
        );

        self.analysis_tokens.advance();
        self.clear_analysis();
        self.extracted = None;
        self.document = Some(document);
        self.state = PipelineState::Extracting;
    }

    /// Extract the selected document and request its analysis
    ///
    /// On success the text is cached, the document bytes are dropped and the
    /// pipeline waits for the returned analysis ticket. On failure the
    /// pipeline is in `Error(extract)` until another file is selected.
    pub fn run_extraction(&mut self) -> Result<AnalysisTicket, PipelineError> {
        if self.state != PipelineState::Extracting {
            return Err(self.not_ready(Stage::Extract));
        }
        let Some(document) = self.document.take() else {
            return Err(self.not_ready(Stage::Extract));
        };

        match self.extractor.extract(&document) {
            Ok(text) => {
                info!(
                    "Extracted {} characters from {} segments (sha256 {})",
                    text.char_count(),
                    text.segment_count,
                    text.digest
                );
                if text.is_blank() {
                    warn!("Document {} contains no extractable text", document.id());
                }
                let text = Arc::new(text);
                self.extracted = Some(Arc::clone(&text));
                Ok(self.begin_analysis(text))
            }
            Err(error) => {
                warn!("Extraction failed: {}", error);
                self.clear_analysis();
                self.extracted = None;
                self.state = PipelineState::Error(ErrorDetail::from(&error));
                Err(error)
            }
        }
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    /// Mint an analysis token for the current mode and wait for it
    fn begin_analysis(&mut self, text: Arc<ExtractedText>) -> AnalysisTicket {
        self.clear_analysis();
        let token = self.analysis_tokens.advance();
        self.state = PipelineState::AnalysisPending;
        debug!("Analysis {} requested in {} mode", token, self.mode);

        AnalysisTicket {
            token,
            mode: self.mode,
            text,
        }
    }

    /// Cached text, if the current state allows analyzing it again
    fn analyzable_text(&self) -> Option<Arc<ExtractedText>> {
        let analyzable = matches!(
            self.state,
            PipelineState::AnalysisPending | PipelineState::AnalysisReady
        ) || self.state.failed_at(Stage::Analyze);
        self.extracted.as_ref().filter(|_| analyzable).map(Arc::clone)
    }

    /// Change the analysis mode
    ///
    /// With extracted text available the cached text is re-analyzed under the
    /// new mode and the ticket is returned; earlier in the pipeline the mode is
    /// only recorded. Selecting the current mode again changes nothing.
    pub fn set_mode(&mut self, mode: AnalysisMode) -> Option<AnalysisTicket> {
        if mode == self.mode {
            return None;
        }

        info!("Analysis mode changed from {} to {}", self.mode, mode);
        self.mode = mode;

        let text = self.analyzable_text()?;
        Some(self.begin_analysis(text))
    }

    /// Re-run analysis of the cached text under the current mode
    pub fn retry_analysis(&mut self) -> Result<AnalysisTicket, PipelineError> {
        match self.analyzable_text() {
            Some(text) => Ok(self.begin_analysis(text)),
            None => Err(self.not_ready(Stage::Analyze)),
        }
    }

    /// Future performing the analysis call of `ticket`
    pub fn dispatch_analysis(&self, ticket: AnalysisTicket) -> BoxFuture<'static, Completion<AnalysisResult>> {
        let service = Arc::clone(&self.services.analysis);
        async move {
            let result = service
                .analyze(&ticket.text.plain_text, ticket.mode)
                .await
                .map(|raw_content| AnalysisResult {
                    raw_content,
                    mode: ticket.mode,
                    request_token: ticket.token,
                });
            Completion {
                token: ticket.token,
                result,
            }
        }
        .boxed()
    }

    /// Apply an analysis completion
    ///
    /// Returns `Stale` for superseded completions, `Applied` when the content
    /// is ready, and the error after recording `Error(analyze)`.
    pub fn commit_analysis(
        &mut self,
        completion: Completion<AnalysisResult>,
    ) -> Result<CommitStatus, PipelineError> {
        if !self.analysis_tokens.is_current(completion.token) || self.state != PipelineState::AnalysisPending {
            debug!(
                "Discarding stale analysis {} (current {})",
                completion.token,
                self.analysis_tokens.current()
            );
            return Ok(CommitStatus::Stale);
        }

        match completion.result {
            Ok(result) => {
                let formatted = self.formatter.format(&result.raw_content);
                info!(
                    "Analysis {} ready: {} blocks, {} references",
                    completion.token,
                    formatted.len(),
                    formatted.references.len()
                );
                self.analysis = Some(result);
                self.formatted = Some(formatted);
                self.state = PipelineState::AnalysisReady;
                Ok(CommitStatus::Applied)
            }
            Err(error) => {
                warn!("Analysis {} failed: {}", completion.token, error);
                self.state = PipelineState::Error(ErrorDetail {
                    stage: Stage::Analyze,
                    message: error.message(),
                });
                Err(error)
            }
        }
    }

    // =========================================================================
    // Translation
    // =========================================================================

    /// Request a translation of the formatted content into the current language
    pub fn request_translation(&mut self) -> Result<TranslationTicket, PipelineError> {
        let Some(formatted) = self.formatted.as_ref().filter(|_| self.state.is_ready()) else {
            return Err(self.not_ready(Stage::Translate));
        };

        let content = formatted.plain_text();
        let token = self.translation_tokens.advance();
        self.translation_error = None;
        debug!("Translation {} requested into {}", token, self.language);

        Ok(TranslationTicket {
            token,
            content,
            target: self.language,
            source_token: self.analysis_tokens.current(),
        })
    }

    /// Future performing the translation call of `ticket`
    pub fn dispatch_translation(
        &self,
        ticket: TranslationTicket,
    ) -> BoxFuture<'static, Completion<TranslationResult>> {
        let service = Arc::clone(&self.services.translation);
        async move {
            let result = service
                .translate(&ticket.content, ticket.target)
                .await
                .map(|translated_text| TranslationResult {
                    translated_text,
                    target_language: ticket.target,
                    source_token: ticket.source_token,
                });
            Completion {
                token: ticket.token,
                result,
            }
        }
        .boxed()
    }

    /// Apply a translation completion
    ///
    /// A failure is recorded as the translation error and returned; content
    /// and analysis are never touched.
    pub fn commit_translation(
        &mut self,
        completion: Completion<TranslationResult>,
    ) -> Result<CommitStatus, PipelineError> {
        if !self.translation_tokens.is_current(completion.token) || !self.state.is_ready() {
            debug!(
                "Discarding stale translation {} (current {})",
                completion.token,
                self.translation_tokens.current()
            );
            return Ok(CommitStatus::Stale);
        }

        match completion.result {
            Ok(result) => {
                info!(
                    "Translation {} into {} ready ({} characters)",
                    completion.token,
                    result.target_language,
                    result.translated_text.chars().count()
                );
                // Speech depends on the translation it may have been made from.
                self.clear_speech();
                self.translation = Some(result);
                self.translation_error = None;
                Ok(CommitStatus::Applied)
            }
            Err(error) => {
                warn!("Translation {} failed: {}", completion.token, error);
                self.translation_error = Some(ErrorDetail::from(&error));
                Err(error)
            }
        }
    }

    /// Change the target language, invalidating translation and speech
    pub fn set_language(&mut self, language: TargetLanguage) {
        if language == self.language {
            return;
        }
        info!("Target language changed from {} to {}", self.language, language);
        self.language = language;
        self.clear_translation();
    }

    // =========================================================================
    // Speech
    // =========================================================================

    /// Request speech for the content (English) or the current translation
    pub fn request_speech(&mut self, source: SpeechSource) -> Result<SpeechTicket, PipelineError> {
        if !self.state.is_ready() {
            return Err(self.not_ready(Stage::Speech));
        }

        let (text, language) = match source {
            SpeechSource::Content => match &self.formatted {
                Some(formatted) => (formatted.plain_text(), TargetLanguage::English),
                None => return Err(self.not_ready(Stage::Speech)),
            },
            SpeechSource::Translation => match &self.translation {
                Some(translation) => (translation.translated_text.clone(), translation.target_language),
                None => {
                    return Err(PipelineError::NotReady {
                        stage: Stage::Speech,
                        state: "missing a translation",
                    });
                }
            },
        };

        let token = self.speech_tokens.advance();
        self.speech_error = None;
        debug!("Speech {} requested for {} in {}", token, source.as_str(), language);

        Ok(SpeechTicket {
            token,
            text,
            language,
            source,
        })
    }

    /// Future performing the speech call of `ticket`
    ///
    /// The audio is only installed for playback once the completion commits.
    pub fn dispatch_speech(&self, ticket: SpeechTicket) -> BoxFuture<'static, Completion<SynthesizedSpeech>> {
        let service = Arc::clone(&self.services.speech);
        async move {
            let result = service
                .synthesize(&ticket.text, ticket.language)
                .await
                .map(|audio| SynthesizedSpeech {
                    audio,
                    language: ticket.language,
                    source: ticket.source,
                });
            Completion {
                token: ticket.token,
                result,
            }
        }
        .boxed()
    }

    /// Apply a speech completion
    ///
    /// A current result releases the previous clip and installs the new
    /// audio. A stale result is dropped without touching the playback store.
    /// A service failure keeps the existing clip.
    pub fn commit_speech(
        &mut self,
        completion: Completion<SynthesizedSpeech>,
    ) -> Result<CommitStatus, PipelineError> {
        if !self.speech_tokens.is_current(completion.token) || !self.state.is_ready() {
            debug!(
                "Discarding stale speech {} (current {})",
                completion.token,
                self.speech_tokens.current()
            );
            return Ok(CommitStatus::Stale);
        }

        let speech = match completion.result {
            Ok(speech) => speech,
            Err(error) => {
                warn!("Speech {} failed: {}", completion.token, error);
                self.speech_error = Some(ErrorDetail::from(&error));
                return Err(error);
            }
        };

        if let Some(previous) = self.speech.take() {
            debug!("Releasing speech clip {}", previous.handle.id());
            self.services.playback.revoke(previous.handle);
        }

        match self.services.playback.install(speech.audio.clone()) {
            Ok(handle) => {
                info!(
                    "Speech {} ready: {} bytes in {}",
                    completion.token,
                    speech.audio.len(),
                    speech.language
                );
                self.speech = Some(SpeechClip {
                    audio: speech.audio,
                    language: speech.language,
                    source: speech.source,
                    handle,
                });
                self.speech_error = None;
                Ok(CommitStatus::Applied)
            }
            Err(error) => {
                warn!("Speech {} could not be installed: {}", completion.token, error);
                self.speech_error = Some(ErrorDetail::from(&error));
                Err(error)
            }
        }
    }

    // =========================================================================
    // Sequential Helpers
    // =========================================================================

    /// Select, extract and analyze a document in one go
    pub async fn load_document(&mut self, document: SourceDocument) -> Result<(), PipelineError> {
        self.select_file(document);
        let ticket = self.run_extraction()?;
        let completion = self.dispatch_analysis(ticket).await;
        self.commit_analysis(completion).map(|_| ())
    }

    /// Analyze the cached text under `mode`, retrying a failed attempt
    pub async fn analyze(&mut self, mode: AnalysisMode) -> Result<(), PipelineError> {
        let ticket = match self.set_mode(mode) {
            Some(ticket) => ticket,
            None if self.state.is_ready() => return Ok(()),
            None => self.retry_analysis()?,
        };
        let completion = self.dispatch_analysis(ticket).await;
        self.commit_analysis(completion).map(|_| ())
    }

    /// Translate the current content into the current language
    pub async fn translate(&mut self) -> Result<(), PipelineError> {
        let ticket = self.request_translation()?;
        let completion = self.dispatch_translation(ticket).await;
        self.commit_translation(completion).map(|_| ())
    }

    /// Synthesize speech for `source`
    pub async fn speak(&mut self, source: SpeechSource) -> Result<(), PipelineError> {
        let ticket = self.request_speech(source)?;
        let completion = self.dispatch_speech(ticket).await;
        self.commit_speech(completion).map(|_| ())
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        if let Some(clip) = self.speech.take() {
            debug!("Releasing speech clip {} on session end", clip.handle.id());
            self.services.playback.revoke(clip.handle);
        }
    }
}
