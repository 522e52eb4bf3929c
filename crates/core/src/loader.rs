//! Dataset-specific text extraction

use serde::{Deserialize, Serialize};
use textscrub_formats::Record;

/// Extracts the text to clean from a raw record
pub trait Loader {
    fn load(&self, record: &Record) -> String;
}

/// Loader for instruction datasets shaped like databricks-dolly-15k.
///
/// Joins the non-empty `prompt`, `context` and `response` fields with
/// newlines. Missing and non-string fields count as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DollyLoader;

impl Loader for DollyLoader {
    fn load(&self, record: &Record) -> String {
        ["prompt", "context", "response"]
            .iter()
            .filter_map(|field| record.get_str(field))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reads one string field, trimmed
#[derive(Debug, Clone)]
pub struct FieldLoader {
    field: String,
}

impl FieldLoader {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for FieldLoader {
    fn default() -> Self {
        Self::new("text")
    }
}

impl Loader for FieldLoader {
    fn load(&self, record: &Record) -> String {
        record
            .get_str(&self.field)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

/// Loader selection for configuration files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LoaderKind {
    #[default]
    Dolly,
    Field { name: String },
}

impl LoaderKind {
    pub fn build(&self) -> Box<dyn Loader> {
        match self {
            LoaderKind::Dolly => Box::new(DollyLoader),
            LoaderKind::Field { name } => Box::new(FieldLoader::new(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => Record::new(map, 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_dolly_loader_skips_empty_context() {
        let rec = record(json!({"prompt": "Hi", "context": "", "response": "there"}));
        assert_eq!(DollyLoader.load(&rec), "Hi\nthere");
    }

    #[test]
    fn test_dolly_loader_all_fields() {
        let rec = record(json!({
            "prompt": " What is Rust? ",
            "context": "A language.",
            "response": "A systems language.\n"
        }));
        assert_eq!(
            DollyLoader.load(&rec),
            "What is Rust?\nA language.\nA systems language."
        );
    }

    #[test]
    fn test_dolly_loader_missing_and_non_string() {
        let rec = record(json!({"prompt": 42, "response": null}));
        assert_eq!(DollyLoader.load(&rec), "");
    }

    #[test]
    fn test_field_loader() {
        let rec = record(json!({"text": "  body  ", "other": 1}));
        assert_eq!(FieldLoader::default().load(&rec), "body");
        assert_eq!(FieldLoader::new("other").load(&rec), "");
    }

    #[test]
    fn test_loader_kind_defaults_to_dolly() {
        assert_eq!(LoaderKind::default(), LoaderKind::Dolly);

        let rec = record(json!({"prompt": "Hi", "response": "there"}));
        assert_eq!(LoaderKind::default().build().load(&rec), "Hi\nthere");
    }

    #[test]
    fn test_loader_kind_from_json() {
        let kind: LoaderKind = serde_json::from_str(r#"{"kind": "field", "name": "body"}"#).unwrap();
        assert_eq!(kind, LoaderKind::Field { name: "body".to_string() });

        let rec = record(json!({"body": "x"}));
        assert_eq!(kind.build().load(&rec), "x");
    }
}
