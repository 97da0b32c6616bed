//! File selections.
//!
//! A file field holds either a [`RawFile`] or, when the field asks for
//! `ui:options.output = "base64"`, a `data:` URI string. Producing the URI
//! is the one genuinely asynchronous step in the form: between selection
//! and completion the field is empty, and a newer selection on the same
//! field supersedes the older read instead of queueing behind it.

use std::{collections::HashMap, path::Path, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{FormError, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    pub name: String,
    /// Declared MIME type, may be empty.
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Encode as a `data:<mime>;base64,<payload>` URI.
    pub fn to_data_url(&self) -> String {
        let mime = if self.mime.is_empty() {
            FALLBACK_MIME
        } else {
            &self.mime
        };
        format!("data:{mime};base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// Read a file from disk.
///
/// `mime` is taken as given; hosts usually know it from the picker.
pub async fn load_file(path: impl AsRef<Path>, mime: Option<&str>) -> Result<RawFile> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FormError::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(RawFile::new(name, mime.unwrap_or(FALLBACK_MIME), bytes))
}

/// A pending conversion of a selected file into a data URI.
#[derive(Debug)]
pub struct FileRead {
    path: String,
    generation: u64,
    file: RawFile,
}

/// The finished conversion, to be handed back to the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReadResult {
    pub path: String,
    generation: u64,
    pub data_url: String,
}

impl FileRead {
    /// Field path this read belongs to.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file(&self) -> &RawFile {
        &self.file
    }

    /// Encode the file off the calling task.
    pub async fn read(self) -> Result<FileReadResult> {
        let FileRead {
            path,
            generation,
            file,
        } = self;
        let data_url = tokio::task::spawn_blocking(move || file.to_data_url()).await?;
        Ok(FileReadResult {
            path,
            generation,
            data_url,
        })
    }
}

/// Per-field generation counters for in-flight reads.
#[derive(Debug, Default)]
pub struct FileReads {
    latest: HashMap<String, u64>,
    counter: u64,
}

impl FileReads {
    /// Start a read for `path`, superseding any earlier one.
    pub fn begin(&mut self, path: &str, file: RawFile) -> FileRead {
        self.counter += 1;
        self.latest.insert(path.to_string(), self.counter);
        FileRead {
            path: path.to_string(),
            generation: self.counter,
            file,
        }
    }

    /// Whether a read for `path` is still outstanding.
    pub fn is_pending(&self, path: &str) -> bool {
        self.latest.contains_key(path)
    }

    /// Accept a result if it is the latest for its field.
    pub fn finish(&mut self, result: &FileReadResult) -> bool {
        match self.latest.get(&result.path) {
            Some(generation) if *generation == result.generation => {
                self.latest.remove(&result.path);
                true
            }
            _ => false,
        }
    }

    /// Forget the outstanding read for one field.
    pub fn cancel(&mut self, path: &str) {
        self.latest.remove(path);
    }

    /// Forget every outstanding read.
    pub fn clear(&mut self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let file = RawFile::new("a.png", "image/png", vec![0x89, 0x50]);
        assert_eq!(file.to_data_url(), "data:image/png;base64,iVA=");
        assert_eq!(file.size(), 2);

        let untyped = RawFile::new("blob", "", vec![]);
        assert_eq!(untyped.to_data_url(), "data:application/octet-stream;base64,");
    }

    #[test]
    fn test_newer_selection_supersedes() {
        let mut reads = FileReads::default();
        let first = reads.begin("avatar", RawFile::new("1.png", "image/png", vec![1]));
        let second = reads.begin("avatar", RawFile::new("2.png", "image/png", vec![2]));

        let first = tokio_test::block_on(first.read()).unwrap();
        let second = tokio_test::block_on(second.read()).unwrap();

        assert!(!reads.finish(&first));
        assert!(reads.is_pending("avatar"));
        assert!(reads.finish(&second));
        assert!(!reads.is_pending("avatar"));
        assert!(!reads.finish(&second));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join("schemaform-load-file.txt");
        std::fs::write(&path, b"hello").unwrap();
        let file = tokio_test::block_on(load_file(&path, Some("text/plain"))).unwrap();
        assert_eq!(file.name, "schemaform-load-file.txt");
        assert_eq!(file.to_data_url(), "data:text/plain;base64,aGVsbG8=");
        let _ = std::fs::remove_file(&path);

        let err = tokio_test::block_on(load_file("/definitely/not/here", None)).unwrap_err();
        assert!(matches!(err, FormError::Io { .. }));
    }
}
