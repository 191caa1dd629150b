use lingua::{Language, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// Only the head of a chapter is inspected; it is enough to settle the language.
const SAMPLE_CHARS: usize = 2000;

/// Share of letters that must be Vietnamese-only for the text to be Vietnamese
/// without consulting the statistical model.
const VIETNAMESE_DENSITY_THRESHOLD: f32 = 0.05;

/// Letters that appear in Vietnamese orthography and in none of the other
/// supported languages. Shared accents (`à`, `é`, `ô`, `ã`...) are left out.
const VIETNAMESE_ONLY_LETTERS: &[char] = &[
    'ă', 'đ', 'ơ', 'ư', 'ả', 'ạ', 'ằ', 'ắ', 'ẳ', 'ẵ', 'ặ', 'ầ', 'ấ', 'ẩ', 'ẫ', 'ậ', 'ẻ', 'ẽ',
    'ẹ', 'ề', 'ế', 'ể', 'ễ', 'ệ', 'ỉ', 'ĩ', 'ị', 'ỏ', 'ọ', 'ồ', 'ố', 'ổ', 'ỗ', 'ộ', 'ờ', 'ớ',
    'ở', 'ỡ', 'ợ', 'ủ', 'ũ', 'ụ', 'ừ', 'ứ', 'ử', 'ữ', 'ự', 'ỳ', 'ỷ', 'ỹ', 'ỵ',
];

/// BCP 47 language tags supported by the audio pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "vi-VN")]
    Vietnamese,
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "es-ES")]
    Spanish,
    #[serde(rename = "fr-FR")]
    French,
    #[serde(rename = "de-DE")]
    German,
    #[serde(rename = "it-IT")]
    Italian,
    #[serde(rename = "pt-PT")]
    Portuguese,
}

/// Language used when detection is inconclusive
pub const DEFAULT_LANGUAGE: LanguageCode = LanguageCode::Vietnamese;

impl LanguageCode {
    pub const ALL: [LanguageCode; 7] = [
        LanguageCode::Vietnamese,
        LanguageCode::English,
        LanguageCode::Spanish,
        LanguageCode::French,
        LanguageCode::German,
        LanguageCode::Italian,
        LanguageCode::Portuguese,
    ];

    /// Get the BCP 47 tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::Vietnamese => "vi-VN",
            LanguageCode::English => "en-US",
            LanguageCode::Spanish => "es-ES",
            LanguageCode::French => "fr-FR",
            LanguageCode::German => "de-DE",
            LanguageCode::Italian => "it-IT",
            LanguageCode::Portuguese => "pt-PT",
        }
    }

    /// Provider-neutral default voice for the language
    pub fn default_voice(&self) -> &'static str {
        match self {
            LanguageCode::Vietnamese => "vi-VN-Standard",
            LanguageCode::English => "en-US-Standard",
            LanguageCode::Spanish => "es-ES-Standard",
            LanguageCode::French => "fr-FR-Standard",
            LanguageCode::German => "de-DE-Standard",
            LanguageCode::Italian => "it-IT-Standard",
            LanguageCode::Portuguese => "pt-PT-Standard",
        }
    }

    /// Parse a tag such as `vi-VN`, `vi_vn` or plain `vi`
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "vi" => Some(LanguageCode::Vietnamese),
            "en" => Some(LanguageCode::English),
            "es" => Some(LanguageCode::Spanish),
            "fr" => Some(LanguageCode::French),
            "de" => Some(LanguageCode::German),
            "it" => Some(LanguageCode::Italian),
            "pt" => Some(LanguageCode::Portuguese),
            _ => None,
        }
    }

    /// Convert lingua Language to LanguageCode
    pub fn from_lingua(language: Language) -> Self {
        match language {
            Language::Vietnamese => LanguageCode::Vietnamese,
            Language::English => LanguageCode::English,
            Language::Spanish => LanguageCode::Spanish,
            Language::French => LanguageCode::French,
            Language::German => LanguageCode::German,
            Language::Italian => LanguageCode::Italian,
            Language::Portuguese => LanguageCode::Portuguese,
        }
    }

    fn to_lingua(self) -> Language {
        match self {
            LanguageCode::Vietnamese => Language::Vietnamese,
            LanguageCode::English => Language::English,
            LanguageCode::Spanish => Language::Spanish,
            LanguageCode::French => Language::French,
            LanguageCode::German => Language::German,
            LanguageCode::Italian => Language::Italian,
            LanguageCode::Portuguese => Language::Portuguese,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedLanguage {
    pub code: LanguageCode,
    pub voice: &'static str,
}

impl From<LanguageCode> for DetectedLanguage {
    fn from(code: LanguageCode) -> Self {
        Self {
            code,
            voice: code.default_voice(),
        }
    }
}

/// Guesses the language of chapter text. Deterministic, never fails.
///
/// Vietnamese is recognised first from the density of letters only its
/// alphabet uses; everything else goes through lingua restricted to the
/// supported languages. Inconclusive input falls back to [`DEFAULT_LANGUAGE`].
pub struct LanguageDetector {
    detector: lingua::LanguageDetector,
}

impl LanguageDetector {
    pub fn new() -> Self {
        let languages: Vec<Language> = LanguageCode::ALL
            .iter()
            .map(|code| code.to_lingua())
            .collect();
        let detector = LanguageDetectorBuilder::from_languages(&languages).build();
        Self { detector }
    }

    pub fn detect(&self, text: &str) -> DetectedLanguage {
        let sample: String = text.chars().take(SAMPLE_CHARS).collect();

        if vietnamese_letter_density(&sample) >= VIETNAMESE_DENSITY_THRESHOLD {
            return LanguageCode::Vietnamese.into();
        }

        match self.detector.detect_language_of(&sample) {
            Some(language) => LanguageCode::from_lingua(language).into(),
            None => {
                tracing::debug!(
                    sample_length = sample.len(),
                    fallback = %DEFAULT_LANGUAGE,
                    "Could not detect language, falling back to default"
                );
                DEFAULT_LANGUAGE.into()
            }
        }
    }
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Ratio of Vietnamese-only letters to all alphabetic characters
pub fn vietnamese_letter_density(text: &str) -> f32 {
    let mut letters = 0usize;
    let mut vietnamese = 0usize;

    for c in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if c.to_lowercase().any(|l| VIETNAMESE_ONLY_LETTERS.contains(&l)) {
            vietnamese += 1;
        }
    }

    if letters == 0 {
        0.0
    } else {
        vietnamese as f32 / letters as f32
    }
}
