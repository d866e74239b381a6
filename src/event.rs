// File change events
//
// Produced by a watcher (or a deploy walk), consumed once by the
// engine and forwarded downstream untouched.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// What the event carries for the file
pub enum Contents {
    /// Fully read file contents: create or update
    Buffer(Vec<u8>),
    /// No contents: the file was removed
    Null,
    /// Open stream, not supported by the engine
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Contents::Null => f.write_str("Null"),
            Contents::Stream(_) => f.write_str("Stream"),
        }
    }
}

#[derive(Debug)]
pub struct FileEvent {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Path relative to the watched root, for display
    pub relative: PathBuf,
    pub contents: Contents,
}

impl FileEvent {
    pub fn buffered(path: impl Into<PathBuf>, relative: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            contents: Contents::Buffer(bytes),
        }
    }

    pub fn deleted(path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            contents: Contents::Null,
        }
    }

    pub fn streamed(
        path: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        stream: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            contents: Contents::Stream(stream),
        }
    }

    /// Read `path` fully into a buffered event, `relative` to `root`.
    pub fn read(root: &Path, path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::buffered(path, relative_display(root, path), bytes))
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.contents, Contents::Buffer(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Null)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream(_))
    }
}

/// `path` relative to `root` when below it, `path` itself otherwise
pub fn relative_display(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_buffers_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets").join("site.css");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"body {}").unwrap();

        let event = FileEvent::read(dir.path(), &path).unwrap();
        assert!(event.is_buffered());
        assert_eq!(event.relative, PathBuf::from("assets/site.css"));
        assert!(matches!(event.contents, Contents::Buffer(ref b) if b == b"body {}"));
    }

    #[test]
    fn test_kinds_are_exclusive() {
        let deleted = FileEvent::deleted("/proj/a.liquid", "a.liquid");
        assert!(deleted.is_null() && !deleted.is_buffered() && !deleted.is_stream());

        let streamed = FileEvent::streamed("/proj/a.liquid", "a.liquid", Box::new(std::io::empty()));
        assert!(streamed.is_stream() && !streamed.is_null());
        assert_eq!(format!("{:?}", streamed.contents), "Stream");
    }

    #[test]
    fn test_relative_display_outside_root() {
        assert_eq!(
            relative_display(Path::new("/proj"), Path::new("/elsewhere/x.css")),
            PathBuf::from("/elsewhere/x.css")
        );
    }
}
