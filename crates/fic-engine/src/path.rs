//! Path canonicalization: the join key for integrity records.
//!
//! Paths are made absolute and normalized lexically (`.` dropped, `..` pops
//! one component). Symlinks are not resolved and the file need not exist, so
//! a deleted file still maps to the key it was added under.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{EngineError, EngineResult};

/// Absolute, normalized form of `path` relative to the current directory.
pub fn canonicalize(path: &Path) -> EngineResult<PathBuf> {
    if path.is_absolute() {
        return resolve_against(Path::new("/"), path);
    }
    let cwd = env::current_dir()
        .map_err(|e| EngineError::InvalidPath(format!("cannot resolve current directory: {e}")))?;
    resolve_against(&cwd, path)
}

/// Absolute, normalized form of `path` relative to `base`.
///
/// `base` must itself be absolute; it is ignored when `path` is absolute.
pub fn resolve_against(base: &Path, path: &Path) -> EngineResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::InvalidPath("empty path".to_string()));
    }
    let joined = base.join(path);
    if !joined.is_absolute() {
        return Err(EngineError::InvalidPath(format!(
            "{} is not absolute",
            joined.display()
        )));
    }

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            // Popping the root is a no-op, matching `/..` == `/`.
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    Ok(out)
}
