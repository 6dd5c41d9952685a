use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

use crate::language_utils::TargetLanguage;
use crate::providers::AnalysisMode;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Language translations and speech are produced in (e.g. `hi-IN`)
    #[serde(default)]
    pub target_language: TargetLanguage,

    /// Analysis service config
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Translation service config
    #[serde(default)]
    pub translation: ServiceConfig,

    /// Speech service config
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Analysis backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisBackend {
    // @backend: Format-analysis service (`POST {endpoint}/analysis/{mode}`)
    #[default]
    Service,
    // @backend: OpenAI-compatible chat completions API
    Chat,
}

impl AnalysisBackend {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Service => "Analysis service",
            Self::Chat => "Chat completions",
        }
    }
}

impl std::fmt::Display for AnalysisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

impl std::str::FromStr for AnalysisBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "chat" => Ok(Self::Chat),
            _ => Err(anyhow!("Invalid analysis backend: {}", s)),
        }
    }
}

/// Analysis configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    // @field: Which backend answers analysis requests
    #[serde(default)]
    pub backend: AnalysisBackend,

    // @field: Analysis service URL
    #[serde(default = "default_service_endpoint")]
    pub endpoint: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Timeout seconds
    #[serde(default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Mode used when none is given on the command line
    #[serde(default)]
    pub default_mode: AnalysisMode,

    // @field: Chat backend settings
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: AnalysisBackend::default(),
            endpoint: default_service_endpoint(),
            api_key: String::new(),
            timeout_secs: default_analysis_timeout_secs(),
            default_mode: AnalysisMode::default(),
            chat: ChatConfig::default(),
        }
    }
}

/// Chat completions backend configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatConfig {
    /// API base URL, `/chat/completions` is appended
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key, required when the chat backend is selected
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum number of tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            model: default_chat_model(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Configuration of a plain JSON service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Service endpoint URL
    #[serde(default = "default_service_endpoint")]
    pub endpoint: String,

    /// API key sent as `api-subscription-key`
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_service_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Speech service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpeechConfig {
    /// Service endpoint URL
    #[serde(default = "default_service_endpoint")]
    pub endpoint: String,

    /// API key sent as `api-subscription-key`
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Voice name
    #[serde(default = "default_speaker")]
    pub speaker: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_service_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            speaker: default_speaker(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_service_endpoint() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_chat_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_chat_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_analysis_timeout_secs() -> u64 {
    // Detailed analyses of long documents take a while
    120
}

fn default_speaker() -> String {
    crate::providers::speech::DEFAULT_SPEAKER.to_string()
}

fn validate_endpoint(name: &str, endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| anyhow!("Invalid {} endpoint '{}': {}", name, endpoint, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("{} endpoint must use http or https: {}", name, endpoint));
    }
    Ok(())
}

fn validate_timeout(name: &str, timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 {
        return Err(anyhow!("{} timeout must be greater than zero", name));
    }
    Ok(())
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.analysis.backend {
            AnalysisBackend::Service => {
                validate_endpoint("Analysis", &self.analysis.endpoint)?;
            }
            AnalysisBackend::Chat => {
                validate_endpoint("Chat", &self.analysis.chat.endpoint)?;
                if self.analysis.chat.api_key.trim().is_empty() {
                    return Err(anyhow!("Chat API key is required for the chat analysis backend"));
                }
                if self.analysis.chat.model.trim().is_empty() {
                    return Err(anyhow!("Chat model is required for the chat analysis backend"));
                }
                if !(0.0..=2.0).contains(&self.analysis.chat.temperature) {
                    return Err(anyhow!(
                        "Chat temperature must be between 0 and 2, got {}",
                        self.analysis.chat.temperature
                    ));
                }
                if self.analysis.chat.max_tokens == 0 {
                    return Err(anyhow!("Chat max_tokens must be greater than zero"));
                }
            }
        }
        validate_timeout("Analysis", self.analysis.timeout_secs)?;

        validate_endpoint("Translation", &self.translation.endpoint)?;
        validate_timeout("Translation", self.translation.timeout_secs)?;

        validate_endpoint("Speech", &self.speech.endpoint)?;
        validate_timeout("Speech", self.speech.timeout_secs)?;
        if self.speech.speaker.trim().is_empty() {
            return Err(anyhow!("Speech speaker must not be empty"));
        }

        Ok(())
    }

    /// Load the configuration at `path`, creating it with defaults if missing
    ///
    /// Returns the configuration and whether the file was created.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json =
            serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: TargetLanguage::default(),
            analysis: AnalysisConfig::default(),
            translation: ServiceConfig::default(),
            speech: SpeechConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
