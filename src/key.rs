// Local path to remote asset key mapping
//
// An asset key is the path of a file relative to the sync root, with
// forward slashes and each segment percent-encoded. The root is a
// `BasePath` resolved once per engine; every key of that engine is
// computed against the same value.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Cannot read current directory: {0}")]
    CurrentDir(#[from] std::io::Error),

    /// Paths without a common root (e.g. different volumes)
    #[error("'{path}' cannot be expressed relative to '{base}'")]
    Unrelated { path: PathBuf, base: PathBuf },
}

/// Absolute, normalized root directory used for key computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePath(PathBuf);

impl BasePath {
    /// Resolve an explicit base directory, or the current working
    /// directory when `explicit` is absent or empty.
    pub fn resolve(explicit: Option<&str>) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(match explicit.map(str::trim) {
            Some(dir) if !dir.is_empty() => Self(normalize(&cwd.join(dir))),
            _ => Self(normalize(&cwd)),
        })
    }

    /// Use an already absolute directory as-is (after normalization)
    pub fn from_absolute(dir: impl AsRef<Path>) -> Self {
        Self(normalize(dir.as_ref()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Compute the remote asset key of `filepath` relative to `base`.
///
/// Relative `filepath`s are taken from the current working directory.
pub fn make_asset_key(filepath: impl AsRef<Path>, base: &BasePath) -> Result<String, KeyError> {
    let filepath = filepath.as_ref();
    let absolute = if filepath.is_absolute() {
        normalize(filepath)
    } else {
        normalize(&std::env::current_dir()?.join(filepath))
    };

    let relative = relative_to(&absolute, base.as_path()).ok_or_else(|| KeyError::Unrelated {
        path: absolute.clone(),
        base: base.as_path().to_path_buf(),
    })?;

    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/");

    Ok(encode_key(&joined))
}

/// Percent-encode every segment of a slash separated key
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically drop `.` and resolve `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Relative path from `base` to `path`, both absolute and normalized.
/// Returns `None` when they do not share a root.
fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let mut path_parts = path.components().peekable();
    let mut base_parts = base.components().peekable();

    // Prefix and root must agree (drive letters on Windows)
    while let (Some(p), Some(b)) = (path_parts.peek(), base_parts.peek()) {
        match (p, b) {
            (Component::Prefix(_) | Component::RootDir, _) | (_, Component::Prefix(_) | Component::RootDir) => {
                if p != b {
                    return None;
                }
            }
            _ if p == b => {}
            _ => break,
        }
        path_parts.next();
        base_parts.next();
    }

    let mut out = PathBuf::new();
    for _ in base_parts {
        out.push("..");
    }
    for part in path_parts {
        out.push(part);
    }
    Some(out)
}
