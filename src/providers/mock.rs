/*!
 * Mock service implementations for testing.
 *
 * Each mock records what it was asked and answers according to a behavior:
 * - `working()` - always succeeds with a deterministic answer
 * - `failing()` - always fails with the stage's service error
 * - `intermittent(n)` - fails every nth call
 * - `slow(ms)` - succeeds after a delay
 *
 * Clones share their call log and counter, so a test can keep a clone and
 * inspect it after handing the original to the controller.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use super::{
    AnalysisMode, AnalysisService, MAX_PAYLOAD_CHARS, SpeechService, TranslationService, truncate_chars,
};
use crate::errors::{PipelineError, Stage};
use crate::language_utils::TargetLanguage;

/// Behavior mode for the mock services
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request); zero never fails
    Intermittent { fail_every: usize },
    /// Always fails with the stage's service error
    Failing,
    /// Always fails at the transport level
    Unreachable,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// State shared by clones of one mock
#[derive(Debug)]
struct MockState<C> {
    behavior: MockBehavior,
    request_count: AtomicUsize,
    calls: Mutex<Vec<C>>,
}

impl<C: Clone> MockState<C> {
    fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            request_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Record a call and decide its outcome
    async fn admit(&self, call: C, stage: Stage) -> Result<(), PipelineError> {
        self.calls.lock().push(call);
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(()),
            MockBehavior::Intermittent { fail_every } if fail_every > 0 && count % fail_every == fail_every - 1 => {
                Err(service_error(stage, format!("Simulated intermittent failure (request #{})", count + 1)))
            }
            MockBehavior::Intermittent { .. } => Ok(()),
            MockBehavior::Failing => Err(service_error(stage, "Simulated service failure".to_string())),
            MockBehavior::Unreachable => Err(PipelineError::Network {
                stage,
                message: "Simulated connection refused".to_string(),
            }),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(())
            }
        }
    }

    fn calls(&self) -> Vec<C> {
        self.calls.lock().clone()
    }

    fn count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

fn service_error(stage: Stage, message: String) -> PipelineError {
    match stage {
        Stage::Extract => PipelineError::Parse(message),
        Stage::Analyze => PipelineError::AnalysisService(message),
        Stage::Translate => PipelineError::TranslationService(message),
        Stage::Speech => PipelineError::SpeechService(message),
    }
}

/// Mock analysis service
#[derive(Debug, Clone)]
pub struct MockAnalysis {
    state: Arc<MockState<(String, AnalysisMode)>>,
    responses: HashMap<AnalysisMode, String>,
    delays: HashMap<AnalysisMode, Duration>,
}

impl MockAnalysis {
    pub fn new(behavior: MockBehavior) -> Self {
        let responses = HashMap::from([
            (AnalysisMode::Summarize, Self::default_response(AnalysisMode::Summarize)),
            (AnalysisMode::Analyze, Self::default_response(AnalysisMode::Analyze)),
        ]);
        Self {
            state: MockState::new(behavior),
            responses,
            delays: HashMap::new(),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn unreachable() -> Self {
        Self::new(MockBehavior::Unreachable)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Answer `mode` requests with `content`
    pub fn with_response(mut self, mode: AnalysisMode, content: impl Into<String>) -> Self {
        self.responses.insert(mode, content.into());
        self
    }

    /// Delay answers to `mode` requests
    pub fn with_delay(mut self, mode: AnalysisMode, delay: Duration) -> Self {
        self.delays.insert(mode, delay);
        self
    }

    /// Canned markup returned for a mode unless overridden
    pub fn default_response(mode: AnalysisMode) -> String {
        match mode {
            AnalysisMode::Summarize => "## Summary\n\
                This is a **lease deed** between the lessor and the lessee.\n\
                - Rent is payable monthly\n\
                - Either party may terminate with notice"
                .to_string(),
            AnalysisMode::Analyze => "## **SUMMARY**\n\
                A residential lease governed by the Transfer of Property Act, 1882.\n\n\
                ## **KEY PARTIES**\n\
                - **Lessor**: the owner\n\
                - **Lessee**: the tenant\n\n\
                ## **RED FLAGS**\n\
                No clause on the security deposit refund."
                .to_string(),
        }
    }

    /// Every (text, mode) pair received, in call order
    pub fn calls(&self) -> Vec<(String, AnalysisMode)> {
        self.state.calls()
    }

    pub fn request_count(&self) -> usize {
        self.state.count()
    }
}

#[async_trait]
impl AnalysisService for MockAnalysis {
    async fn analyze(&self, text: &str, mode: AnalysisMode) -> Result<String, PipelineError> {
        self.state.admit((text.to_string(), mode), Stage::Analyze).await?;
        if let Some(delay) = self.delays.get(&mode) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.responses.get(&mode).cloned().unwrap_or_default())
    }
}

/// Mock translation service
///
/// Answers with the received input tagged by the target code, so tests can
/// see exactly what would have been transmitted.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    state: Arc<MockState<(String, TargetLanguage)>>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            state: MockState::new(behavior),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Deterministic translation of an already truncated payload
    pub fn render(input: &str, target: TargetLanguage) -> String {
        format!("[{}] {}", target.code(), input)
    }

    /// Every transmitted (payload, target) pair, in call order
    pub fn calls(&self) -> Vec<(String, TargetLanguage)> {
        self.state.calls()
    }

    pub fn last_payload(&self) -> Option<String> {
        self.state.calls().pop().map(|(payload, _)| payload)
    }

    pub fn request_count(&self) -> usize {
        self.state.count()
    }
}

#[async_trait]
impl TranslationService for MockTranslator {
    async fn translate(&self, content: &str, target: TargetLanguage) -> Result<String, PipelineError> {
        let payload = truncate_chars(content, MAX_PAYLOAD_CHARS);
        self.state.admit((payload.to_string(), target), Stage::Translate).await?;
        Ok(Self::render(payload, target))
    }
}

/// Mock speech service
///
/// The "audio" is the transmitted text tagged by the language code.
#[derive(Debug, Clone)]
pub struct MockSpeech {
    state: Arc<MockState<(String, TargetLanguage)>>,
}

impl MockSpeech {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            state: MockState::new(behavior),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn render(payload: &str, language: TargetLanguage) -> Bytes {
        Bytes::from(format!("AUDIO[{}]:{}", language.code(), payload))
    }

    pub fn calls(&self) -> Vec<(String, TargetLanguage)> {
        self.state.calls()
    }

    pub fn request_count(&self) -> usize {
        self.state.count()
    }
}

#[async_trait]
impl SpeechService for MockSpeech {
    async fn synthesize(&self, text: &str, language: TargetLanguage) -> Result<Bytes, PipelineError> {
        let payload = truncate_chars(text, MAX_PAYLOAD_CHARS);
        self.state.admit((payload.to_string(), language), Stage::Speech).await?;
        Ok(Self::render(payload, language))
    }
}
