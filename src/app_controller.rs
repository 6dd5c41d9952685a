use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{AnalysisBackend, Config};
use crate::file_utils::FileManager;
use crate::language_utils::TargetLanguage;
use crate::pipeline::{ErrorDetail, PipelineController, PipelineServices, SpeechSource};
use crate::playback::TempFileStore;
use crate::providers::{
    AnalysisClient, AnalysisMode, AnalysisService, ChatAnalysisClient, SessionContext, SpeechSynthesizer,
    TranslationClient,
};

// @module: Application controller for document analysis sessions

/// What a single run should produce
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    // @field: Analysis mode
    pub mode: AnalysisMode,
    // @field: Language for translation and translated speech
    pub target_language: TargetLanguage,
    // @field: Whether to translate the analysis
    pub translate: bool,
    // @field: Text to synthesize, if any
    pub speak: Option<SpeechSource>,
    // @field: Also write an HTML rendering
    pub html: bool,
    // @field: Overwrite existing outputs
    pub force_overwrite: bool,
}

impl RunOptions {
    /// Options taken from the configuration alone
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.analysis.default_mode,
            target_language: config.target_language,
            translate: false,
            speak: None,
            html: false,
            force_overwrite: false,
        }
    }
}

/// Files written by a run and the stage errors it survived
#[derive(Debug, Default)]
pub struct RunReport {
    pub analysis_path: Option<PathBuf>,
    pub html_path: Option<PathBuf>,
    pub translation_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    /// Statutory references found in the analysis
    pub references: Vec<String>,
    /// Translation and speech failures; analysis output is still written
    pub errors: Vec<ErrorDetail>,
}

impl RunReport {
    /// Whether the run was skipped because its output already existed
    pub fn is_skipped(&self) -> bool {
        self.analysis_path.is_none()
    }
}

/// Main application controller for document analysis
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Service handles shared by every pipeline session
    services: PipelineServices,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_session(config, SessionContext::anonymous())
    }

    /// Create a controller forwarding `session` to the services
    pub fn with_session(config: Config, session: SessionContext) -> Result<Self> {
        let services = Self::build_services(&config, session)?;
        Ok(Self { config, services })
    }

    /// Create a controller on top of already built services
    pub fn with_services(config: Config, services: PipelineServices) -> Self {
        Self { config, services }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the HTTP clients and the playback store described by `config`
    pub fn build_services(config: &Config, session: SessionContext) -> Result<PipelineServices> {
        let analysis: Arc<dyn AnalysisService> = match config.analysis.backend {
            AnalysisBackend::Service => Arc::new(
                AnalysisClient::new(&config.analysis.endpoint, Duration::from_secs(config.analysis.timeout_secs))?
                    .with_api_key(config.analysis.api_key.clone())
                    .with_session(session.clone()),
            ),
            AnalysisBackend::Chat => {
                let chat = &config.analysis.chat;
                Arc::new(
                    ChatAnalysisClient::new(
                        &chat.endpoint,
                        &chat.api_key,
                        chat.model.clone(),
                        Duration::from_secs(config.analysis.timeout_secs),
                    )?
                    .with_temperature(chat.temperature)
                    .with_max_tokens(chat.max_tokens),
                )
            }
        };

        let translation = TranslationClient::new(
            &config.translation.endpoint,
            Duration::from_secs(config.translation.timeout_secs),
        )?
        .with_api_key(config.translation.api_key.clone())
        .with_session(session.clone());

        let speech = SpeechSynthesizer::new(&config.speech.endpoint, Duration::from_secs(config.speech.timeout_secs))?
            .with_api_key(config.speech.api_key.clone())
            .with_speaker(config.speech.speaker.clone())
            .with_session(session);

        let playback = TempFileStore::new().context("Failed to prepare audio storage")?;

        info!(
            "Using {} backend for analysis",
            config.analysis.backend.display_name()
        );

        Ok(PipelineServices {
            analysis,
            translation: Arc::new(translation),
            speech: Arc::new(speech),
            playback: Arc::new(playback),
        })
    }

    /// Run one analysis session for `input_file`, writing outputs to `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, options: &RunOptions) -> Result<RunReport> {
        let start_time = Instant::now();
        let mut report = RunReport::default();

        FileManager::ensure_dir(&output_dir)?;

        let analysis_path =
            FileManager::generate_output_path(&input_file, &output_dir, options.mode.as_str(), "md");
        if analysis_path.exists() && !options.force_overwrite {
            warn!("Skipping file, analysis already exists (use -f to force overwrite)");
            return Ok(report);
        }

        let document = FileManager::load_document(&input_file)?;
        let mut pipeline = PipelineController::new(self.services.clone())
            .with_mode(options.mode)
            .with_language(options.target_language);

        // Extraction and analysis
        let spinner = Self::spinner("Extracting text");
        pipeline.select_file(document);
        let ticket = match pipeline.run_extraction() {
            Ok(ticket) => ticket,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(anyhow!(e)).context(format!("Failed to extract text from {:?}", input_file));
            }
        };

        spinner.set_message(format!("Running {} analysis", options.mode));
        let completion = pipeline.dispatch_analysis(ticket).await;
        let committed = pipeline.commit_analysis(completion);
        spinner.finish_and_clear();
        committed.map_err(|e| anyhow!(e)).context("Analysis failed")?;

        let content = pipeline
            .formatted_content()
            .ok_or_else(|| anyhow!("Analysis finished without content"))?;

        FileManager::write_to_file(&analysis_path, &Self::analysis_document(&content.markup(), &content.references))?;
        info!("Success: {}", analysis_path.display());
        report.references = content.references.clone();

        if options.html {
            let html_path = FileManager::generate_output_path(&input_file, &output_dir, options.mode.as_str(), "html");
            FileManager::write_to_file(&html_path, &content.html())?;
            report.html_path = Some(html_path);
        }
        report.analysis_path = Some(analysis_path);

        // Translation
        if options.translate {
            let spinner = Self::spinner(format!("Translating into {}", options.target_language.display_name()));
            let translated = pipeline.translate().await;
            spinner.finish_and_clear();

            match translated {
                Ok(()) => {
                    if let Some(translation) = pipeline.translation() {
                        let path = FileManager::generate_output_path(
                            &input_file,
                            &output_dir,
                            &translation.target_language.code(),
                            "txt",
                        );
                        FileManager::write_to_file(&path, &translation.translated_text)?;
                        info!("Success: {}", path.display());
                        report.translation_path = Some(path);
                    }
                }
                Err(e) => {
                    warn!("Translation failed, keeping the analysis: {}", e);
                    report.errors.push(ErrorDetail::from(&e));
                }
            }
        }

        // Speech
        if let Some(source) = options.speak {
            let spinner = Self::spinner("Synthesizing speech");
            let spoken = pipeline.speak(source).await;
            spinner.finish_and_clear();

            match spoken {
                Ok(()) => {
                    if let Some(clip) = pipeline.speech_clip() {
                        let path =
                            FileManager::generate_output_path(&input_file, &output_dir, &clip.language.code(), "wav");
                        Self::save_clip(clip.handle.path(), &clip.audio, &path)?;
                        info!("Success: {}", path.display());
                        report.audio_path = Some(path);
                    }
                }
                Err(e) => {
                    warn!("Speech synthesis failed: {}", e);
                    report.errors.push(ErrorDetail::from(&e));
                }
            }
        }

        info!("Finished in {}", Self::format_duration(start_time.elapsed()));
        Ok(report)
    }

    /// Analysis markup followed by its references
    fn analysis_document(markup: &str, references: &[String]) -> String {
        if references.is_empty() {
            return format!("{}\n", markup);
        }

        let list = references
            .iter()
            .map(|reference| format!("- {}", reference))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\n## References\n\n{}\n", markup, list)
    }

    fn save_clip(source: Option<&Path>, audio: &[u8], destination: &Path) -> Result<()> {
        match source {
            Some(path) => FileManager::copy_file(path, destination),
            None => FileManager::write_bytes(destination, audio),
        }
    }

    fn spinner(message: impl Into<std::borrow::Cow<'static, str>>) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
