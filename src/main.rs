// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use legaldoc::app_config::{AnalysisBackend, Config, LogLevel};
use legaldoc::app_controller::{Controller, RunOptions};
use legaldoc::errors::AppError;
use legaldoc::language_utils::TargetLanguage;
use legaldoc::pipeline::SpeechSource;
use legaldoc::providers::{AnalysisMode, SessionContext};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a legal document (PDF or DOCX)
    Analyze(AnalyzeArgs),

    /// List the supported target languages
    Languages,

    /// Generate shell completions for legaldoc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Document to analyze
    #[arg(value_name = "FILE")]
    input_file: PathBuf,

    /// Analysis mode (defaults to the configured mode)
    #[arg(short, long, value_enum)]
    mode: Option<AnalysisMode>,

    /// Target language code for translation and speech (e.g. 'hi-IN', 'ta')
    #[arg(short, long, value_parser = parse_language)]
    target_language: Option<TargetLanguage>,

    /// Translate the analysis into the target language
    #[arg(long)]
    translate: bool,

    /// Synthesize speech from the analysis content or its translation
    #[arg(long, value_enum)]
    speak: Option<SpeechSource>,

    /// Also write an HTML rendering of the analysis
    #[arg(long)]
    html: bool,

    /// Directory outputs are written to (defaults to the document's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Analysis backend to use
    #[arg(short, long, value_enum)]
    backend: Option<AnalysisBackend>,

    /// Identity token forwarded to the services
    #[arg(long, env = "LEGALDOC_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<LogLevel>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// legaldoc - legal document analysis
///
/// Extracts the text of a legal document, analyzes it through a remote
/// analysis service and optionally translates and reads the result aloud.
#[derive(Parser, Debug)]
#[command(name = "legaldoc")]
#[command(version)]
#[command(about = "Legal document analysis, translation and speech")]
#[command(long_about = "legaldoc extracts text from PDF and DOCX documents, sends it to an analysis service and writes the formatted analysis next to the document.

EXAMPLES:
    legaldoc analyze deed.pdf                          # Summarize using the default config
    legaldoc analyze -m analyze deed.docx              # Detailed analysis
    legaldoc analyze --translate -t ta-IN deed.pdf     # Summarize and translate into Tamil
    legaldoc analyze --speak translation deed.pdf      # Translate and read the translation aloud
    legaldoc analyze -b chat deed.pdf                  # Use the chat completions backend
    legaldoc languages                                 # List target languages
    legaldoc completions bash > legaldoc.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

fn parse_language(value: &str) -> Result<TargetLanguage, String> {
    value.parse::<TargetLanguage>().map_err(|e| e.to_string())
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Colour and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The level can be lowered later through log::set_max_level
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at trace and narrow once the configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "legaldoc", &mut std::io::stdout());
            Ok(())
        }
        Commands::Languages => {
            for language in TargetLanguage::ALL {
                println!("{:<6} {}", language.code(), language.display_name());
            }
            Ok(())
        }
        Commands::Analyze(args) => run_analyze(args).await,
    }
}

async fn run_analyze(options: AnalyzeArgs) -> Result<()> {
    if let Some(level) = options.log_level {
        log::set_max_level(level.level_filter());
    }

    let (mut config, _) = Config::load_or_create(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(backend) = options.backend {
        config.analysis.backend = backend;
    }
    if let Some(language) = options.target_language {
        config.target_language = language;
    }
    if let Some(level) = options.log_level {
        config.log_level = level;
    }

    config
        .validate()
        .map_err(|e| AppError::Config(e.to_string()))
        .context("Configuration validation failed")?;
    log::set_max_level(config.log_level.level_filter());

    if !options.input_file.is_file() {
        return Err(AppError::File(format!("Input file does not exist: {:?}", options.input_file)).into());
    }

    let session = match options.session_token.as_deref() {
        Some(token) if !token.trim().is_empty() => SessionContext::with_token(token.trim()),
        _ => SessionContext::anonymous(),
    };
    let controller = Controller::with_session(config.clone(), session)?;

    let mut run_options = RunOptions::from_config(&config);
    if let Some(mode) = options.mode {
        run_options.mode = mode;
    }
    // Speaking a translation implies producing one
    run_options.translate = options.translate || options.speak == Some(SpeechSource::Translation);
    run_options.speak = options.speak;
    run_options.html = options.html;
    run_options.force_overwrite = options.force_overwrite;

    let output_dir = options.output_dir.clone().unwrap_or_else(|| {
        options
            .input_file
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf()
    });

    info!("Analyzing {:?} ({})", options.input_file, run_options.mode);
    let report = controller
        .run(options.input_file.clone(), output_dir, &run_options)
        .await?;

    if report.is_skipped() {
        return Ok(());
    }

    if !report.references.is_empty() {
        info!("References: {}", report.references.join("; "));
    }
    for failure in &report.errors {
        error!("{}", failure);
    }
    if !report.errors.is_empty() {
        warn!("Finished with {} stage failure(s)", report.errors.len());
    }

    Ok(())
}
