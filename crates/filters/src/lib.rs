//! Text filters for dataset cleaning
//!
//! PII masking, language detection and the token-count record filter.

pub mod error;
pub mod language;
pub mod pii;
pub mod record_filter;
pub mod tokenizer;

pub use error::{Error, Result};
pub use language::{DetectorConfig, LanguageDetector, WhatlangDetector};
pub use pii::mask_pii;
pub use record_filter::{filter_record, DropReason, FilterConfig, FilterDecision, RecordFilter};
pub use tokenizer::{Cl100kTokenizer, Tokenizer, TokenizerKind, WhitespaceTokenizer};
