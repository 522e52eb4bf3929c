//! Language detection
//!
//! The record filter only needs "which language is this text in?", so the
//! capability is a single-method trait. [`WhatlangDetector`] is the default
//! implementation; detection failures are reported as errors and the caller
//! decides what they mean.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use whatlang::{detect, Lang};

/// Something that can name the language of a text
pub trait LanguageDetector {
    /// ISO 639-3 code of the dominant language in `text`
    fn detect(&self, text: &str) -> Result<String>;
}

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum confidence threshold (0.0 to 1.0)
    pub min_confidence: f64,
    /// Treat detections whatlang marks as unreliable as failures
    pub require_reliable: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            require_reliable: false,
        }
    }
}

/// Trigram-based detection using whatlang
#[derive(Debug, Clone)]
pub struct WhatlangDetector {
    min_confidence: f64,
    require_reliable: bool,
}

impl WhatlangDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.min_confidence) {
            return Err(Error::InvalidConfig(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(Self {
            min_confidence: config.min_confidence,
            require_reliable: config.require_reliable,
        })
    }

    /// Detect language with confidence score
    pub fn detect_with_confidence(&self, text: &str) -> Option<(Lang, f64)> {
        detect(text).map(|info| (info.lang(), info.confidence()))
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            require_reliable: false,
        }
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String> {
        let info = detect(text)
            .ok_or_else(|| Error::Detection("no language could be identified".to_string()))?;

        if self.require_reliable && !info.is_reliable() {
            return Err(Error::Detection(format!(
                "unreliable detection ({}, confidence {:.2})",
                info.lang().code(),
                info.confidence()
            )));
        }

        if info.confidence() < self.min_confidence {
            return Err(Error::Detection(format!(
                "confidence {:.2} for {} below threshold {:.2}",
                info.confidence(),
                info.lang().code(),
                self.min_confidence
            )));
        }

        Ok(info.lang().code().to_string())
    }
}

/// Normalize an ISO 639-1 or 639-3 language code to ISO 639-3
pub fn normalize_language_code(code: &str) -> Result<&'static str> {
    let lang = match code.to_lowercase().as_str() {
        "eng" | "en" => Lang::Eng,
        "spa" | "es" => Lang::Spa,
        "fra" | "fr" => Lang::Fra,
        "deu" | "de" => Lang::Deu,
        "por" | "pt" => Lang::Por,
        "rus" | "ru" => Lang::Rus,
        "jpn" | "ja" => Lang::Jpn,
        "zho" | "zh" => Lang::Cmn,
        "ara" | "ar" => Lang::Ara,
        "hin" | "hi" => Lang::Hin,
        "ita" | "it" => Lang::Ita,
        "nld" | "nl" => Lang::Nld,
        "pol" | "pl" => Lang::Pol,
        "tur" | "tr" => Lang::Tur,
        "vie" | "vi" => Lang::Vie,
        "kor" | "ko" => Lang::Kor,
        "swe" | "sv" => Lang::Swe,
        "dan" | "da" => Lang::Dan,
        "fin" | "fi" => Lang::Fin,
        "nor" | "no" => Lang::Nob,
        other => Lang::from_code(other).ok_or_else(|| {
            Error::InvalidConfig(format!("Unsupported language code: {}", code))
        })?,
    };
    Ok(lang.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_detection() {
        let detector = WhatlangDetector::default();

        let english_text = "This is a sample English text that should be detected correctly.";
        assert_eq!(detector.detect(english_text).unwrap(), "eng");

        let spanish_text = "Este es un texto en español que debería ser detectado correctamente.";
        assert_eq!(detector.detect(spanish_text).unwrap(), "spa");
    }

    #[test]
    fn test_undetectable_text_is_an_error() {
        let detector = WhatlangDetector::default();

        assert!(matches!(detector.detect(""), Err(Error::Detection(_))));
        assert!(matches!(detector.detect("1234 5678"), Err(Error::Detection(_))));
    }

    #[test]
    fn test_confidence_threshold() {
        let detector = WhatlangDetector::new(DetectorConfig {
            min_confidence: 0.9,
            require_reliable: false,
        })
        .unwrap();

        let clear_english =
            "The quick brown fox jumps over the lazy dog. This is clearly English text.";
        assert_eq!(detector.detect(clear_english).unwrap(), "eng");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let result = WhatlangDetector::new(DetectorConfig {
            min_confidence: 1.5,
            require_reliable: false,
        });
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_detect_with_confidence() {
        let detector = WhatlangDetector::default();

        let english_text = "This is a clear English sentence with enough words for detection.";
        let (lang, confidence) = detector.detect_with_confidence(english_text).unwrap();

        assert_eq!(lang, Lang::Eng);
        assert!(confidence > 0.5);
    }

    #[test]
    fn test_language_code_normalization() {
        assert_eq!(normalize_language_code("eng").unwrap(), "eng");
        assert_eq!(normalize_language_code("en").unwrap(), "eng");
        assert_eq!(normalize_language_code("ES").unwrap(), "spa");
        assert_eq!(normalize_language_code("zh").unwrap(), "cmn");
        assert_eq!(normalize_language_code("ukr").unwrap(), "ukr");
        assert!(normalize_language_code("invalid").is_err());
    }
}
