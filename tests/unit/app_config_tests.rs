/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use legaldoc::app_config::{AnalysisBackend, Config, LogLevel};
use legaldoc::language_utils::TargetLanguage;
use legaldoc::providers::AnalysisMode;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.target_language, TargetLanguage::Hindi);
    assert_eq!(config.analysis.backend, AnalysisBackend::Service);
    assert_eq!(config.analysis.default_mode, AnalysisMode::Summarize);
    assert_eq!(config.analysis.timeout_secs, 120);
    assert_eq!(config.translation.timeout_secs, 30);
    assert_eq!(config.speech.speaker, "meera");
    assert_eq!(config.analysis.chat.model, "llama3-8b-8192");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.translation.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.translation.endpoint = "ftp://example.com".to_string();
    assert!(config.validate().is_err());
    config.translation.endpoint = "https://translate.example.com/api".to_string();
    assert!(config.validate().is_ok());

    config.speech.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.speech.timeout_secs = 10;

    // The chat backend requires an API key
    config.analysis.backend = AnalysisBackend::Chat;
    assert!(config.validate().is_err());
    config.analysis.chat.api_key = "gsk-test".to_string();
    assert!(config.validate().is_ok());

    config.analysis.chat.temperature = 3.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(
        r#"{
            "target_language": "ta-IN",
            "analysis": { "default_mode": "analyze" },
            "log_level": "debug"
        }"#,
    )?;

    assert_eq!(config.target_language, TargetLanguage::Tamil);
    assert_eq!(config.analysis.default_mode, AnalysisMode::Analyze);
    assert_eq!(config.analysis.endpoint, Config::default().analysis.endpoint);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_config_deserialize_withUnsupportedLanguage_shouldFail() {
    let result = serde_json::from_str::<Config>(r#"{ "target_language": "fr-FR" }"#);
    assert!(result.is_err());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path)?;
    assert!(created);
    assert!(path.exists());
    assert_eq!(config, Config::default());

    let (reloaded, created) = Config::load_or_create(&path)?;
    assert!(!created);
    assert_eq!(reloaded, config);
    Ok(())
}

#[test]
fn test_save_withCustomValues_shouldRoundTripThroughFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("custom.json");

    let mut config = Config::default();
    config.target_language = TargetLanguage::Kannada;
    config.speech.speaker = "arvind".to_string();
    config.save(&path)?;

    let (loaded, created) = Config::load_or_create(&path)?;
    assert!(!created);
    assert_eq!(loaded, config);

    let json = std::fs::read_to_string(&path)?;
    assert!(json.contains("\"kn-IN\""));
    Ok(())
}

#[test]
fn test_analysisBackend_fromStr_shouldAcceptKnownNames() {
    assert_eq!("Chat".parse::<AnalysisBackend>().unwrap(), AnalysisBackend::Chat);
    assert_eq!("service".parse::<AnalysisBackend>().unwrap(), AnalysisBackend::Service);
    assert!("ollama".parse::<AnalysisBackend>().is_err());
}
