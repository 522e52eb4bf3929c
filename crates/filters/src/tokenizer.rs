//! Tokenizers used for token-count filtering
//!
//! Only the number of tokens matters to the filter, but the capability
//! mirrors a real encoder so any BPE implementation can be plugged in.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

/// Text encoder producing token ids
pub trait Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }
}

/// Available tokenizer implementations, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// OpenAI cl100k_base BPE
    #[default]
    Cl100k,
    /// One token per whitespace-separated word
    Whitespace,
}

impl TokenizerKind {
    pub fn build(self) -> Result<Box<dyn Tokenizer>> {
        Ok(match self {
            TokenizerKind::Cl100k => Box::new(Cl100kTokenizer::new()?),
            TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer),
        })
    }
}

/// The cl100k_base byte-pair encoding
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| Error::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(self
            .bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect())
    }
}

/// Splits on Unicode whitespace; token ids are word positions
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok((0..text.split_whitespace().count() as u32).collect())
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}
