use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language utilities for the translation and speech stages
///
/// The remote services accept a closed set of region-tagged codes (`hi-IN`,
/// `ta-IN`, ...). This module owns that set, parses user input into it and
/// resolves display names through ISO 639.
/// Fixed source language of every translation request
pub const SOURCE_LANGUAGE: &str = "en";

/// Region suffix shared by every supported code
const REGION: &str = "IN";

/// Closed set of languages offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum TargetLanguage {
    English,
    #[default]
    Hindi,
    Bengali,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Marathi,
    Gujarati,
    Punjabi,
    Odia,
}

impl TargetLanguage {
    /// Every supported language, in the order shown to the user
    pub const ALL: [TargetLanguage; 11] = [
        Self::English,
        Self::Hindi,
        Self::Bengali,
        Self::Tamil,
        Self::Telugu,
        Self::Kannada,
        Self::Malayalam,
        Self::Marathi,
        Self::Gujarati,
        Self::Punjabi,
        Self::Odia,
    ];

    /// ISO 639-1 code of the language
    pub fn iso_639_1(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Bengali => "bn",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Marathi => "mr",
            Self::Gujarati => "gu",
            Self::Punjabi => "pa",
            Self::Odia => "or",
        }
    }

    /// Region-tagged code sent to the services (e.g. `hi-IN`)
    pub fn code(&self) -> String {
        format!("{}-{}", self.iso_639_1(), REGION)
    }

    /// English display name resolved through ISO 639
    pub fn display_name(&self) -> String {
        get_language_name(self.iso_639_1()).unwrap_or_else(|_| self.iso_639_1().to_string())
    }

    /// Whether this is the fixed source language
    pub fn is_source(&self) -> bool {
        language_codes_match(self.iso_639_1(), SOURCE_LANGUAGE)
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let primary = primary_subtag(s);
        if let Some(region) = region_subtag(s) {
            if !region.eq_ignore_ascii_case(REGION) {
                return Err(anyhow!("Unsupported language region: {}", s));
            }
        }

        let part1 = normalize_to_part1(primary)?;
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.iso_639_1() == part1)
            .ok_or_else(|| anyhow!("Unsupported target language: {}", s))
    }
}

impl TryFrom<String> for TargetLanguage {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TargetLanguage> for String {
    fn from(value: TargetLanguage) -> Self {
        value.code()
    }
}

/// Primary language subtag of a BCP 47 style code (`hi` for `hi-IN`)
fn primary_subtag(code: &str) -> &str {
    code.trim().split(['-', '_']).next().unwrap_or_default()
}

/// Region subtag of a BCP 47 style code, if any
fn region_subtag(code: &str) -> Option<&str> {
    code.trim().split(['-', '_']).nth(1)
}

/// Normalize a language code to ISO 639-1 (2-letter) format
///
/// Accepts ISO 639-1 codes and ISO 639-3 codes that have a 639-1 equivalent.
pub fn normalize_to_part1(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    let language = match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(&normalized_code),
        _ => None,
    };

    language
        .and_then(|lang| lang.to_639_1())
        .map(|part1| part1.to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (
        normalize_to_part1(primary_subtag(code1)),
        normalize_to_part1(primary_subtag(code2)),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let part1 = normalize_to_part1(primary_subtag(code))?;
    let lang = Language::from_639_1(&part1)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", part1))?;

    Ok(lang.to_name().to_string())
}
