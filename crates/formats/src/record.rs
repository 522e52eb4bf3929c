//! Record data structure for one parsed input line

use serde_json::{Map, Value};

/// A JSON object read from one line of a dataset file
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The parsed object
    pub data: Map<String, Value>,
    /// 1-based line number in the (decompressed) source
    pub source_line: usize,
}

impl Record {
    /// Create a new record
    pub fn new(data: Map<String, Value>, source_line: usize) -> Self {
        Self { data, source_line }
    }

    /// Get a field as a string slice.
    ///
    /// Missing fields and non-string values both yield `None`.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Consume the record, returning the underlying object
    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}
