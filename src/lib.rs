/*!
 * # legaldoc - legal document analysis
 *
 * A Rust library that extracts the text of legal documents, analyzes it
 * through remote services and optionally translates and synthesizes speech
 * from the result.
 *
 * ## Features
 *
 * - Text extraction from PDF (page order) and DOCX (paragraph order)
 * - Summary or detailed analysis through a format-analysis service or a
 *   chat completions API
 * - Formatting of the raw analysis into headings, paragraphs and lists,
 *   with statutory references pulled out
 * - Translation into Indian languages and speech synthesis
 * - Staleness-safe pipeline: results of superseded requests are dropped
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `extraction`: PDF and DOCX text extraction
 * - `content`: Formatting, rendering and reference extraction
 * - `providers`: Service traits and clients for analysis, translation and speech
 * - `pipeline`: The document pipeline state machine and its request tokens
 * - `playback`: Storage of synthesized audio clips
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: Target language codes
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod content;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod playback;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use content::{ContentFormatter, FormattedContent};
pub use errors::{AppError, PipelineError, ProviderError, Stage};
pub use extraction::{ExtractedText, FormatExtractor, SourceDocument};
pub use language_utils::TargetLanguage;
pub use pipeline::{PipelineController, PipelineServices, PipelineState};
pub use providers::{AnalysisMode, AnalysisService, SpeechService, TranslationService};
