//! Keep/drop gate for extracted record text
//!
//! Checks run in a fixed order and the first failing check decides:
//! empty text, then language, then token count. Every drop is logged with
//! its reason.

use crate::language::{normalize_language_code, LanguageDetector};
use crate::tokenizer::Tokenizer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const EXCERPT_CHARS: usize = 120;

/// Filter thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Fewest tokens a kept text may have (inclusive)
    pub min_tokens: usize,
    /// Most tokens a kept text may have (inclusive)
    pub max_tokens: usize,
    /// ISO 639-1 or 639-3 code of the language to keep
    pub target_language: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_tokens: 5,
            max_tokens: 1024,
            target_language: "eng".to_string(),
        }
    }
}

/// Why a text was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Empty,
    LanguageMismatch { detected: String },
    DetectionFailed { reason: String },
    TokenCount { count: usize, min: usize, max: usize },
}

impl DropReason {
    /// Short stable label, used as a statistics key
    pub fn kind(&self) -> &'static str {
        match self {
            DropReason::Empty => "empty",
            DropReason::LanguageMismatch { .. } => "language",
            DropReason::DetectionFailed { .. } => "detection_failed",
            DropReason::TokenCount { .. } => "token_count",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Empty => write!(f, "text is empty"),
            DropReason::LanguageMismatch { detected } => {
                write!(f, "language mismatch (detected {})", detected)
            }
            DropReason::DetectionFailed { reason } => {
                write!(f, "language detection failed: {}", reason)
            }
            DropReason::TokenCount { count, min, max } => {
                write!(f, "token count {} out of bounds [{}, {}]", count, min, max)
            }
        }
    }
}

/// Outcome of evaluating one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Keep,
    Drop(DropReason),
}

impl FilterDecision {
    pub fn is_drop(&self) -> bool {
        matches!(self, FilterDecision::Drop(_))
    }
}

/// Language and token-count filter
pub struct RecordFilter {
    min_tokens: usize,
    max_tokens: usize,
    target_language: &'static str,
    detector: Box<dyn LanguageDetector>,
}

impl RecordFilter {
    pub fn new(config: FilterConfig, detector: Box<dyn LanguageDetector>) -> Result<Self> {
        if config.min_tokens > config.max_tokens {
            return Err(Error::InvalidConfig(format!(
                "min_tokens ({}) must not exceed max_tokens ({})",
                config.min_tokens, config.max_tokens
            )));
        }

        Ok(Self {
            min_tokens: config.min_tokens,
            max_tokens: config.max_tokens,
            target_language: normalize_language_code(&config.target_language)?,
            detector,
        })
    }

    pub fn target_language(&self) -> &'static str {
        self.target_language
    }

    /// Decide whether to keep `text`.
    ///
    /// Detector failures become drops; tokenizer failures are returned as
    /// errors.
    pub fn evaluate(&self, text: &str, tokenizer: &dyn Tokenizer) -> Result<FilterDecision> {
        if text.trim().is_empty() {
            warn!("Record text is empty or does not exist: {:?}", text);
            return Ok(FilterDecision::Drop(DropReason::Empty));
        }

        match self.detector.detect(text) {
            Ok(detected) => {
                let matches = normalize_language_code(&detected)
                    .map(|code| code == self.target_language)
                    .unwrap_or(false);
                if !matches {
                    warn!(
                        "Record text is not {} (detected {}): {}",
                        self.target_language,
                        detected,
                        excerpt(text)
                    );
                    return Ok(FilterDecision::Drop(DropReason::LanguageMismatch { detected }));
                }
            }
            Err(e) => {
                warn!("Language detection failed ({}): {}", e, excerpt(text));
                return Ok(FilterDecision::Drop(DropReason::DetectionFailed {
                    reason: e.to_string(),
                }));
            }
        }

        let count = tokenizer.count_tokens(text)?;
        if count < self.min_tokens || count > self.max_tokens {
            warn!(
                "Record token count {} out of bounds [{}, {}]: {}",
                count,
                self.min_tokens,
                self.max_tokens,
                excerpt(text)
            );
            return Ok(FilterDecision::Drop(DropReason::TokenCount {
                count,
                min: self.min_tokens,
                max: self.max_tokens,
            }));
        }

        Ok(FilterDecision::Keep)
    }

    /// `true` when `text` should be dropped
    pub fn should_drop(&self, text: &str, tokenizer: &dyn Tokenizer) -> Result<bool> {
        Ok(self.evaluate(text, tokenizer)?.is_drop())
    }
}

/// One-shot English filter; `true` means drop
pub fn filter_record(
    text: &str,
    tokenizer: &dyn Tokenizer,
    detector: Box<dyn LanguageDetector>,
    min_tokens: usize,
    max_tokens: usize,
) -> Result<bool> {
    let filter = RecordFilter::new(
        FilterConfig {
            min_tokens,
            max_tokens,
            ..Default::default()
        },
        detector,
    )?;
    filter.should_drop(text, tokenizer)
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{:?}...", &text[..idx]),
        None => format!("{:?}", text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::WhatlangDetector;
    use crate::tokenizer::WhitespaceTokenizer;

    struct FixedDetector(&'static str);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingDetector;

    impl LanguageDetector for FailingDetector {
        fn detect(&self, _text: &str) -> Result<String> {
            Err(Error::Detection("too short".to_string()))
        }
    }

    struct BrokenTokenizer;

    impl Tokenizer for BrokenTokenizer {
        fn encode(&self, _text: &str) -> Result<Vec<u32>> {
            Err(Error::Tokenizer("vocabulary missing".to_string()))
        }
    }

    fn english_filter(min_tokens: usize, max_tokens: usize) -> RecordFilter {
        RecordFilter::new(
            FilterConfig {
                min_tokens,
                max_tokens,
                target_language: "en".to_string(),
            },
            Box::new(FixedDetector("eng")),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_and_whitespace_dropped() {
        let filter = english_filter(1, 10);
        for text in ["", "   ", "\n\t"] {
            assert_eq!(
                filter.evaluate(text, &WhitespaceTokenizer).unwrap(),
                FilterDecision::Drop(DropReason::Empty)
            );
        }
    }

    #[test]
    fn test_language_mismatch_dropped() {
        let filter = RecordFilter::new(FilterConfig::default(), Box::new(FixedDetector("por")))
            .unwrap();

        let decision = filter
            .evaluate("Oi, bom dia. Tudo bem com voce hoje?", &WhitespaceTokenizer)
            .unwrap();

        assert_eq!(
            decision,
            FilterDecision::Drop(DropReason::LanguageMismatch {
                detected: "por".to_string()
            })
        );
    }

    #[test]
    fn test_detection_failure_is_distinct_drop() {
        let filter = RecordFilter::new(FilterConfig::default(), Box::new(FailingDetector)).unwrap();

        let decision = filter.evaluate("Hi there", &WhitespaceTokenizer).unwrap();

        match decision {
            FilterDecision::Drop(reason) => assert_eq!(reason.kind(), "detection_failed"),
            FilterDecision::Keep => panic!("expected drop"),
        }
    }

    #[test]
    fn test_token_bounds_inclusive() {
        let filter = english_filter(3, 5);
        let tok = WhitespaceTokenizer;

        assert!(filter.should_drop("one two", &tok).unwrap());
        assert!(!filter.should_drop("one two three", &tok).unwrap());
        assert!(!filter.should_drop("one two three four", &tok).unwrap());
        assert!(!filter.should_drop("one two three four five", &tok).unwrap());
        assert!(filter.should_drop("one two three four five six", &tok).unwrap());
    }

    #[test]
    fn test_token_count_reason() {
        let filter = english_filter(5, 1024);

        let decision = filter.evaluate("Hi", &WhitespaceTokenizer).unwrap();

        assert_eq!(
            decision,
            FilterDecision::Drop(DropReason::TokenCount {
                count: 1,
                min: 5,
                max: 1024
            })
        );
    }

    #[test]
    fn test_tokenizer_error_propagates() {
        let filter = english_filter(1, 10);
        let result = filter.evaluate("some english words", &BrokenTokenizer);
        assert!(matches!(result, Err(Error::Tokenizer(_))));
    }

    #[test]
    fn test_invalid_config() {
        let bad_bounds = RecordFilter::new(
            FilterConfig {
                min_tokens: 10,
                max_tokens: 5,
                ..Default::default()
            },
            Box::new(FixedDetector("eng")),
        );
        assert!(matches!(bad_bounds, Err(Error::InvalidConfig(_))));

        let bad_language = RecordFilter::new(
            FilterConfig {
                target_language: "klingon".to_string(),
                ..Default::default()
            },
            Box::new(FixedDetector("eng")),
        );
        assert!(bad_language.is_err());
    }

    #[test]
    fn test_filter_record_with_whatlang() {
        let tok = WhitespaceTokenizer;
        let english = "This is a sample English text that should be detected correctly.";
        let spanish = "Este es un texto en español que debería ser detectado correctamente.";

        assert!(!filter_record(english, &tok, Box::new(WhatlangDetector::default()), 5, 1024).unwrap());
        assert!(filter_record(spanish, &tok, Box::new(WhatlangDetector::default()), 5, 1024).unwrap());
        assert!(filter_record("", &tok, Box::new(WhatlangDetector::default()), 5, 1024).unwrap());
    }
}
