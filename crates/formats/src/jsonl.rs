//! Streaming JSONL (JSON Lines) reader
//!
//! Reads line-delimited JSON one line at a time, with transparent gzip
//! decompression for `.gz` files. Each malformed-input case has its own
//! policy so callers choose between aborting the stream, dropping the line
//! quietly, or dropping it with a warning.

use crate::{Error, Record, Result};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Placeholder substituted for undecodable bytes
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

const BOM: char = '\u{FEFF}';

/// Longest line excerpt included in a diagnostic
const PREVIEW_CHARS: usize = 200;

/// What to do when a line is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Yield an error and end the stream
    Raise,
    /// Drop the line, logging only at debug level
    Skip,
    /// Drop (or for decode errors, keep) the line with a warning
    Log,
}

/// How malformed byte sequences become text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrors {
    /// Fail the stream on the first malformed sequence
    Strict,
    /// Drop malformed bytes
    Ignore,
    /// Substitute U+FFFD for each malformed sequence
    #[default]
    Replace,
}

/// Character encoding of the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
}

/// Predicate applied to every parsed record before it is yielded.
///
/// Returning `Ok(false)` or any error skips the record; errors never
/// propagate out of the reader.
pub trait RecordValidator {
    fn validate(&self, record: &Map<String, Value>) -> anyhow::Result<bool>;
}

impl<F> RecordValidator for F
where
    F: Fn(&Map<String, Value>) -> anyhow::Result<bool>,
{
    fn validate(&self, record: &Map<String, Value>) -> anyhow::Result<bool> {
        self(record)
    }
}

/// Validator that requires a set of fields to be present and non-null
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequiredFields {
    pub fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl RecordValidator for RequiredFields {
    fn validate(&self, record: &Map<String, Value>) -> anyhow::Result<bool> {
        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| record.get(f.as_str()).map_or(true, Value::is_null))
        {
            anyhow::bail!("missing required field '{}'", missing);
        }
        Ok(true)
    }
}

fn default_on_bad_decode() -> ErrorPolicy {
    ErrorPolicy::Log
}

fn default_on_bad_json() -> ErrorPolicy {
    ErrorPolicy::Raise
}

fn default_strip_bom() -> bool {
    true
}

fn default_buffer_size() -> usize {
    64 * 1024
}

/// Configuration for JSONL reader
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Input text encoding
    pub encoding: TextEncoding,
    /// Handling of malformed byte sequences during decoding
    pub decode_errors: DecodeErrors,
    /// Policy for lines containing the replacement character
    #[serde(default = "default_on_bad_decode")]
    pub on_bad_decode: ErrorPolicy,
    /// Policy for lines that are not valid JSON
    #[serde(default = "default_on_bad_json")]
    pub on_bad_json: ErrorPolicy,
    /// Strip a byte-order mark from the first non-empty line
    #[serde(default = "default_strip_bom")]
    pub strip_bom: bool,
    /// Buffer size for BufReader
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Optional record predicate
    #[serde(skip)]
    pub validator: Option<Arc<dyn RecordValidator + Send + Sync>>,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf8,
            decode_errors: DecodeErrors::Replace,
            on_bad_decode: default_on_bad_decode(),
            on_bad_json: default_on_bad_json(),
            strip_bom: default_strip_bom(),
            buffer_size: default_buffer_size(),
            validator: None,
        }
    }
}

impl fmt::Debug for JsonlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonlConfig")
            .field("encoding", &self.encoding)
            .field("decode_errors", &self.decode_errors)
            .field("on_bad_decode", &self.on_bad_decode)
            .field("on_bad_json", &self.on_bad_json)
            .field("strip_bom", &self.strip_bom)
            .field("buffer_size", &self.buffer_size)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl JsonlConfig {
    pub fn with_on_bad_json(mut self, policy: ErrorPolicy) -> Self {
        self.on_bad_json = policy;
        self
    }

    pub fn with_on_bad_decode(mut self, policy: ErrorPolicy) -> Self {
        self.on_bad_decode = policy;
        self
    }

    pub fn with_decode_errors(mut self, decode_errors: DecodeErrors) -> Self {
        self.decode_errors = decode_errors;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_strip_bom(mut self, strip_bom: bool) -> Self {
        self.strip_bom = strip_bom;
        self
    }

    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: RecordValidator + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }
}

/// Streaming JSONL reader that processes files line-by-line
pub struct JsonlReader<R: Read> {
    reader: BufReader<R>,
    config: JsonlConfig,
    line_number: usize,
    bytes_read: u64,
    total_bytes: Option<u64>,
    records_yielded: usize,
    seen_content: bool,
    finished: bool,
    buf: Vec<u8>,
}

impl JsonlReader<Box<dyn Read>> {
    /// Open a JSONL file with default settings, auto-detecting gzip compression
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, JsonlConfig::default())
    }

    /// Open a JSONL file, auto-detecting gzip compression
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: JsonlConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let total_bytes = file.metadata()?.len();

        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => {
                debug!("Opening gzip-compressed JSONL file: {:?}", path);
                let reader: Box<dyn Read> = Box::new(MultiGzDecoder::new(file));
                Ok(Self::new_with_config(reader, config, None))
            }
            _ => {
                debug!("Opening plain JSONL file: {:?}", path);
                let reader: Box<dyn Read> = Box::new(file);
                Ok(Self::new_with_config(reader, config, Some(total_bytes)))
            }
        }
    }
}

impl<R: Read> JsonlReader<R> {
    /// Create a new JSONL reader from any Read source
    pub fn new(reader: R) -> Self {
        Self::new_with_config(reader, JsonlConfig::default(), None)
    }

    /// Create a new JSONL reader with custom configuration
    pub fn new_with_config(reader: R, config: JsonlConfig, total_bytes: Option<u64>) -> Self {
        let buf_reader = BufReader::with_capacity(config.buffer_size, reader);
        Self {
            reader: buf_reader,
            config,
            line_number: 0,
            bytes_read: 0,
            total_bytes,
            records_yielded: 0,
            seen_content: false,
            finished: false,
            buf: Vec::new(),
        }
    }

    /// Get the number of lines read, blank lines included
    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    /// Get the number of records yielded so far
    pub fn records_yielded(&self) -> usize {
        self.records_yielded
    }

    /// Get the number of (decompressed) bytes read
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    /// Get total file size if known
    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn config(&self) -> &JsonlConfig {
        &self.config
    }

    /// Turn one decoded line into a record, or `None` if it is dropped
    fn parse_line(&mut self, line: &str) -> Result<Option<Record>> {
        let line_no = self.line_number;
        let mut text = line.trim();
        if text.is_empty() {
            return Ok(None);
        }

        if !self.seen_content {
            self.seen_content = true;
            if self.config.strip_bom {
                if let Some(rest) = text.strip_prefix(BOM) {
                    debug!("Stripped byte-order mark at line {}", line_no);
                    text = rest;
                }
            }
        }

        if text.contains(REPLACEMENT_CHAR) {
            match self.config.on_bad_decode {
                ErrorPolicy::Raise => return Err(Error::BadDecode { line: line_no }),
                ErrorPolicy::Skip => {
                    debug!("Skipping undecodable line {}", line_no);
                    return Ok(None);
                }
                ErrorPolicy::Log => {
                    warn!(
                        "Undecodable characters at line {}: {}",
                        line_no,
                        preview(text)
                    );
                }
            }
        }

        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(e) => {
                return match self.config.on_bad_json {
                    ErrorPolicy::Raise => Err(Error::BadJson {
                        line: line_no,
                        source: e,
                    }),
                    ErrorPolicy::Skip => {
                        debug!("Skipping malformed JSON at line {}: {}", line_no, e);
                        Ok(None)
                    }
                    ErrorPolicy::Log => {
                        warn!(
                            "Failed to parse JSON at line {}: {} - Error: {}",
                            line_no,
                            preview(text),
                            e
                        );
                        Ok(None)
                    }
                };
            }
        };

        let map = match value {
            Value::Object(map) => map,
            other => {
                warn!(
                    "Skipping non-object JSON value at line {}: {}",
                    line_no,
                    json_kind(&other)
                );
                return Ok(None);
            }
        };

        if let Some(validator) = &self.config.validator {
            match validator.validate(&map) {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Record at line {} failed validation", line_no);
                    return Ok(None);
                }
                Err(e) => {
                    warn!("Validator error at line {}: {:#}", line_no, e);
                    return Ok(None);
                }
            }
        }

        Ok(Some(Record::new(map, line_no)))
    }

    fn fail(&mut self, error: Error) -> Option<Result<Record>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<R: Read> Iterator for JsonlReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(n) => {
                    self.bytes_read += n as u64;
                    self.line_number += 1;
                }
                Err(e) => return self.fail(Error::Io(e)),
            }

            let line = match decode(
                &self.buf,
                self.config.encoding,
                self.config.decode_errors,
                self.line_number,
            ) {
                Ok(line) => line.into_owned(),
                Err(e) => return self.fail(e),
            };

            match self.parse_line(&line) {
                Ok(Some(record)) => {
                    self.records_yielded += 1;
                    return Some(Ok(record));
                }
                Ok(None) => continue,
                Err(e) => return self.fail(e),
            }
        }
    }
}

/// Decode one raw line according to the configured encoding
fn decode(
    bytes: &[u8],
    encoding: TextEncoding,
    errors: DecodeErrors,
    line: usize,
) -> Result<Cow<'_, str>> {
    match encoding {
        TextEncoding::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
        TextEncoding::Utf8 => match errors {
            DecodeErrors::Strict => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| Error::Decode {
                    line,
                    detail: e.to_string(),
                }),
            DecodeErrors::Ignore => Ok(Cow::Owned(
                bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
            )),
            DecodeErrors::Replace => Ok(String::from_utf8_lossy(bytes)),
        },
    }
}

fn preview(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &text[..idx])),
        None => Cow::Borrowed(text),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
