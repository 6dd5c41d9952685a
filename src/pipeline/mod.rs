/*!
 * Orchestration of the document pipeline.
 *
 * - `state`: pipeline state, request tokens, completions and artifacts
 * - `controller`: the state machine owning one analysis session
 */

pub mod controller;
pub mod state;

pub use self::controller::{
    AnalysisTicket, PipelineController, PipelineServices, SpeechTicket, TranslationTicket,
};
pub use self::state::{
    AnalysisResult, CommitStatus, Completion, ErrorDetail, PipelineState, RequestToken, SpeechClip,
    SpeechSource, SynthesizedSpeech, TokenCounter, TranslationResult,
};
