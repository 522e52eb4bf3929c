//! Atomic output files
//!
//! Output is written to a temporary file in the same directory as the
//! destination and renamed over it on commit, so the destination is only
//! ever absent, in its previous state, or fully written. Dropping a
//! transaction without committing deletes the temporary file.

use crate::{Error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Required suffix for compressed JSONL output
pub const JSONL_GZ_SUFFIX: &str = ".jsonl.gz";

/// Check that `path` names a compressed JSONL file
pub fn validate_jsonl_gz_path(path: &Path) -> Result<()> {
    let is_jsonl_gz = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.len() > JSONL_GZ_SUFFIX.len() && n.ends_with(JSONL_GZ_SUFFIX))
        .unwrap_or(false);

    if is_jsonl_gz {
        Ok(())
    } else {
        Err(Error::InvalidOutputPath(path.to_path_buf()))
    }
}

/// A temporary sibling of a target path, renamed onto the target on commit
pub struct FileTransaction {
    temp: NamedTempFile,
    target: PathBuf,
}

impl FileTransaction {
    /// Create the temporary file next to `target`.
    ///
    /// Nothing at `target` is touched until [`commit`](Self::commit).
    pub fn begin(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => {
                return Err(Error::InvalidFile(format!(
                    "Cannot determine parent directory for: {}",
                    target.display()
                )))
            }
        };

        let temp = tempfile::Builder::new()
            .prefix(".tmp-")
            .suffix(".part")
            .tempfile_in(&parent)?;
        debug!("Opened transaction {:?} -> {:?}", temp.path(), target);

        Ok(Self { temp, target })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Flush to disk and atomically rename the temporary file onto the target
    pub fn commit(mut self) -> Result<PathBuf> {
        self.temp.flush()?;
        self.temp.as_file().sync_all()?;

        let target = self.target;
        self.temp.persist(&target).map_err(|e| Error::Persist {
            path: target.clone(),
            source: e.error,
        })?;
        debug!("Committed {:?}", target);
        Ok(target)
    }

    /// Delete the temporary file, leaving the target untouched
    pub fn abort(self) -> Result<()> {
        debug!("Aborting transaction for {:?}", self.target);
        self.temp.close()?;
        Ok(())
    }
}

impl Write for FileTransaction {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.temp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.temp.flush()
    }
}

/// Gzip-compressed JSONL writer backed by a [`FileTransaction`]
pub struct JsonlGzWriter {
    encoder: GzEncoder<BufWriter<FileTransaction>>,
    records_written: usize,
}

impl JsonlGzWriter {
    /// Start writing `target`, which must end in `.jsonl.gz`.
    ///
    /// The name is checked before any file is created.
    pub fn create(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref();
        validate_jsonl_gz_path(target)?;

        let tx = FileTransaction::begin(target)?;
        Ok(Self {
            encoder: GzEncoder::new(BufWriter::new(tx), Compression::default()),
            records_written: 0,
        })
    }

    /// Serialize `value` as one JSON line
    pub fn write_record<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.encoder, value)?;
        self.encoder.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn target(&self) -> &Path {
        self.encoder.get_ref().get_ref().target()
    }

    /// Finish the gzip stream and commit the transaction
    pub fn commit(self) -> Result<PathBuf> {
        let buffered = self.encoder.finish()?;
        let tx = buffered.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        tx.commit()
    }

    /// Discard everything written so far
    pub fn abort(self) -> Result<()> {
        let temp_path = self.encoder.get_ref().get_ref().temp_path().to_path_buf();
        drop(self);
        if temp_path.exists() {
            std::fs::remove_file(&temp_path)?;
        }
        Ok(())
    }
}

/// Write `target` atomically through a [`JsonlGzWriter`].
///
/// The writer is committed when `write` returns `Ok` and aborted when it
/// returns `Err`; in both cases no temporary file is left behind.
pub fn write_jsonl_gz<T, E, F>(target: impl AsRef<Path>, write: F) -> std::result::Result<T, E>
where
    E: From<Error>,
    F: FnOnce(&mut JsonlGzWriter) -> std::result::Result<T, E>,
{
    let mut writer = JsonlGzWriter::create(target)?;

    match write(&mut writer) {
        Ok(value) => {
            writer.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(cleanup) = writer.abort() {
                warn!("Failed to remove temporary output: {}", cleanup);
            }
            Err(e)
        }
    }
}

/// Write a plain file atomically; used for uncompressed exports
pub fn write_atomically<T, E, F>(target: impl AsRef<Path>, write: F) -> std::result::Result<T, E>
where
    E: From<Error>,
    F: FnOnce(&mut BufWriter<&mut File>) -> std::result::Result<T, E>,
{
    let mut tx = FileTransaction::begin(target)?;

    let result = {
        let mut buffered = BufWriter::new(tx.temp.as_file_mut());
        write(&mut buffered).and_then(|value| {
            buffered.flush().map_err(Error::Io)?;
            Ok(value)
        })
    };

    match result {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(cleanup) = tx.abort() {
                warn!("Failed to remove temporary output: {}", cleanup);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .expect("Failed to read dir")
            .map(|e| e.unwrap().path())
            .collect()
    }

    fn read_gz(path: &Path) -> String {
        let mut out = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_validate_jsonl_gz_path() {
        assert!(validate_jsonl_gz_path(Path::new("out/data.jsonl.gz")).is_ok());
        assert!(validate_jsonl_gz_path(Path::new("data.jsonl")).is_err());
        assert!(validate_jsonl_gz_path(Path::new("data.json.gz")).is_err());
        assert!(validate_jsonl_gz_path(Path::new("data.gz")).is_err());
        assert!(validate_jsonl_gz_path(Path::new(".jsonl.gz")).is_err());
    }

    #[test]
    fn test_successful_write() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("output.jsonl.gz");

        let mut writer = JsonlGzWriter::create(&final_path).unwrap();
        writer.write_record(&json!({"text": "alpha"})).unwrap();
        writer.write_record(&json!({"text": "beta"})).unwrap();
        assert_eq!(writer.records_written(), 2);

        let result_path = writer.commit().unwrap();

        assert_eq!(result_path, final_path);
        assert_eq!(read_gz(&final_path), "{\"text\":\"alpha\"}\n{\"text\":\"beta\"}\n");
        assert_eq!(dir_entries(temp_dir.path()), vec![final_path]);
    }

    #[test]
    fn test_invalid_extension_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("output.jsonl");

        let result = JsonlGzWriter::create(&final_path);

        assert!(matches!(result, Err(Error::InvalidOutputPath(_))));
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_temp_file_is_sibling() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("output.jsonl.gz");

        let tx = FileTransaction::begin(&final_path).unwrap();

        assert_eq!(tx.temp_path().parent(), final_path.parent());
        assert!(tx.temp_path().exists());
        assert!(!final_path.exists());
    }

    #[test]
    fn test_drop_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("output.jsonl.gz");

        {
            let mut writer = JsonlGzWriter::create(&final_path).unwrap();
            writer.write_record(&json!({"text": "never committed"})).unwrap();
        }

        assert!(dir_entries(temp_dir.path()).is_empty());
        assert!(!final_path.exists());
    }

    #[test]
    fn test_abort_preserves_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("output.jsonl.gz");
        fs::write(&final_path, b"OLD_CONTENT").unwrap();

        let mut writer = JsonlGzWriter::create(&final_path).unwrap();
        writer.write_record(&json!({"text": "new"})).unwrap();
        writer.abort().unwrap();

        assert_eq!(fs::read(&final_path).unwrap(), b"OLD_CONTENT");
        assert_eq!(dir_entries(temp_dir.path()), vec![final_path]);
    }

    #[test]
    fn test_overwrite_behavior() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("output.jsonl.gz");
        fs::write(&final_path, b"OLD_CONTENT").unwrap();

        let mut writer = JsonlGzWriter::create(&final_path).unwrap();
        writer.write_record(&json!({"text": "new"})).unwrap();
        writer.commit().unwrap();

        assert_eq!(read_gz(&final_path), "{\"text\":\"new\"}\n");
    }

    #[test]
    fn test_empty_output_is_valid_gzip() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("empty.jsonl.gz");

        JsonlGzWriter::create(&final_path).unwrap().commit().unwrap();

        assert!(read_gz(&final_path).is_empty());
    }

    #[test]
    fn test_scoped_write_commits_on_ok() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("scoped.jsonl.gz");

        let count = write_jsonl_gz(&final_path, |w| -> Result<usize> {
            w.write_record(&json!({"text": "one"}))?;
            Ok(w.records_written())
        })
        .unwrap();

        assert_eq!(count, 1);
        assert!(final_path.exists());
    }

    #[test]
    fn test_scoped_write_aborts_on_err() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("scoped.jsonl.gz");

        let result = write_jsonl_gz(&final_path, |w| -> Result<()> {
            w.write_record(&json!({"text": "one"}))?;
            Err(Error::InvalidFile("boom".to_string()))
        });

        assert!(matches!(result, Err(Error::InvalidFile(_))));
        assert!(dir_entries(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_write_atomically_plain() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("plain.jsonl");

        write_atomically(&final_path, |w| -> Result<()> {
            writeln!(w, "{{\"a\":1}}")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&final_path).unwrap(), "{\"a\":1}\n");
        assert_eq!(dir_entries(temp_dir.path()).len(), 1);
    }

    #[test]
    fn test_write_atomically_cleans_up_on_error() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("plain.jsonl");

        let result = write_atomically(&final_path, |w| -> Result<()> {
            writeln!(w, "partial")?;
            Err(Error::InvalidFile("boom".to_string()))
        });

        assert!(result.is_err());
        assert!(dir_entries(temp_dir.path()).is_empty());
    }
}
