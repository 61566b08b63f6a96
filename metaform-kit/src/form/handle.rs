//! Field handles and file access.
//!
//! A mounted widget owns its state and exposes it through [`FieldHandle`].
//! The aggregator only keeps weak references to handles and asks them for
//! their value when a payload is built.

use std::io;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::value::Primitive;

/// A file picked in a file field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name shown to the user and used in error messages
    pub name: String,

    /// Location the content is read from
    pub path: String,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        FileEntry {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Create an entry named after the last component of `path`
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = std::path::Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        FileEntry { name, path }
    }
}

/// The live value of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleValue {
    Scalar(Primitive),
    List(Vec<Primitive>),
    Files(Vec<FileEntry>),
}

impl HandleValue {
    /// Text form used in the flat payload. Lists join with commas; files
    /// join their names.
    pub fn to_text(&self) -> String {
        match self {
            HandleValue::Scalar(value) => value.to_text(),
            HandleValue::List(values) => values
                .iter()
                .map(Primitive::to_text)
                .collect::<Vec<_>>()
                .join(","),
            HandleValue::Files(files) => files
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Whether a required field would count as unfilled
    pub fn is_empty(&self) -> bool {
        match self {
            HandleValue::Scalar(value) => value.is_blank(),
            HandleValue::List(values) => values.iter().all(Primitive::is_blank),
            HandleValue::Files(files) => files.is_empty(),
        }
    }
}

/// Accessor a mounted widget registers with the aggregator.
pub trait FieldHandle {
    /// Read the current value
    fn current_value(&self) -> HandleValue;

    /// Comma-joined selection, for widgets that report through it
    fn selection(&self) -> Option<String> {
        None
    }

    /// Reset a file input after a read failure
    fn clear_files(&self) {}
}

/// Reads the content of picked files.
pub trait FileSource {
    fn read(&self, file: &FileEntry) -> LocalBoxFuture<'static, io::Result<Vec<u8>>>;
}

/// [`FileSource`] reading from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileSource;

impl FileSource for FsFileSource {
    fn read(&self, file: &FileEntry) -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
        read_file(file.path.clone()).boxed_local()
    }
}

cfg_if::cfg_if! {
    if #[cfg(not(target_arch = "wasm32"))] {
        async fn read_file(path: String) -> io::Result<Vec<u8>> {
            async_fs::read(path).await
        }
    } else {
        async fn read_file(path: String) -> io::Result<Vec<u8>> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot read {path} on this platform"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_text_joins() {
        let value = HandleValue::List(vec![Primitive::string("a"), Primitive::from(2_i64)]);
        assert_eq!(value.to_text(), "a,2");
    }

    #[test]
    fn test_emptiness() {
        assert!(HandleValue::Scalar(Primitive::string("  ")).is_empty());
        assert!(!HandleValue::Scalar(Primitive::from(0_i64)).is_empty());
        assert!(!HandleValue::Scalar(Primitive::Bool(false)).is_empty());
        assert!(HandleValue::List(vec![]).is_empty());
        assert!(HandleValue::Files(vec![]).is_empty());
    }

    #[test]
    fn test_file_entry_from_path() {
        let file = FileEntry::from_path("/tmp/scans/report.pdf");
        assert_eq!(file.name, "report.pdf");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_fs_source_reports_missing_file() {
        let file = FileEntry::new("ghost.bin", "/definitely/not/here/ghost.bin");
        let result = futures::executor::block_on(FsFileSource.read(&file));
        assert!(result.is_err());
    }
}
