//! Conversion from compressed to plain JSONL

use crate::jsonl::{JsonlConfig, JsonlReader};
use crate::writer::{validate_jsonl_gz_path, write_atomically, JSONL_GZ_SUFFIX};
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Decompress `input` (`*.jsonl.gz`) into a sibling `*.jsonl` file.
///
/// Every line is parsed and re-serialized, so a malformed line aborts the
/// conversion and leaves no output behind.
pub fn decompress_jsonl_gz(input: impl AsRef<Path>) -> Result<PathBuf> {
    let input = input.as_ref();
    validate_jsonl_gz_path(input)
        .map_err(|_| Error::InvalidFile(format!("Input must end in .jsonl.gz: {}", input.display())))?;

    if !input.exists() {
        return Err(Error::InvalidFile(format!(
            "Input file does not exist: {}",
            input.display()
        )));
    }

    let output = plain_jsonl_path(input);
    let reader = JsonlReader::open_with_config(input, JsonlConfig::default())?;

    let count = write_atomically(&output, |w| -> Result<usize> {
        let mut count = 0;
        for record in reader {
            serde_json::to_writer(&mut *w, &record?.data)?;
            w.write_all(b"\n")?;
            count += 1;
        }
        Ok(count)
    })?;

    info!("Converted {} records from {:?} to {:?}", count, input, output);
    Ok(output)
}

fn plain_jsonl_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(JSONL_GZ_SUFFIX).unwrap_or(name);
    input.with_file_name(format!("{}.jsonl", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::{self, File};

    fn write_gz(path: &Path, body: &str) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_decompress_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("dolly.jsonl.gz");
        write_gz(&input, "{\"text\": \"a\"}\n\n{\"text\": \"b\"}\n");

        let output = decompress_jsonl_gz(&input).unwrap();

        assert_eq!(output, temp_dir.path().join("dolly.jsonl"));
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "{\"text\":\"a\"}\n{\"text\":\"b\"}\n"
        );
    }

    #[test]
    fn test_decompress_rejects_wrong_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("dolly.json.gz");
        write_gz(&input, "{}\n");

        assert!(matches!(decompress_jsonl_gz(&input), Err(Error::InvalidFile(_))));
    }

    #[test]
    fn test_decompress_missing_input() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("missing.jsonl.gz");

        assert!(matches!(decompress_jsonl_gz(&input), Err(Error::InvalidFile(_))));
    }

    #[test]
    fn test_decompress_malformed_leaves_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("bad.jsonl.gz");
        write_gz(&input, "{\"text\": \"a\"}\nnot json\n");

        assert!(matches!(
            decompress_jsonl_gz(&input),
            Err(Error::BadJson { line: 2, .. })
        ));
        assert!(!temp_dir.path().join("bad.jsonl").exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
