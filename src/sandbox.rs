//! Path containment for tool operations.
//!
//! Every path the model supplies is resolved against a single sandbox root
//! fixed at startup. Resolution canonicalizes the deepest existing ancestor
//! of the candidate so `..` segments and symlinks cannot smuggle an operation
//! outside the root, and the containment check runs before any existence
//! check so a nonexistent-but-escaping path is rejected as an escape, not
//! reported as missing.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox root \"{path}\": {source}")]
    Root {
        path: String,
        source: std::io::Error,
    },

    #[error("sandbox root \"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("\"{0}\" escapes the sandbox root")]
    Escape(String),
}

/// The directory all tool operations are confined to.
///
/// Canonicalized once at construction and then immutable; ownership is
/// threaded to the tool registry rather than held in a global.
#[derive(Debug, Clone)]
pub struct SandboxRoot(PathBuf);

impl SandboxRoot {
    /// Canonicalize and validate the root directory.
    pub fn new(path: &Path) -> Result<Self, SandboxError> {
        let canonical = std::fs::canonicalize(path).map_err(|source| SandboxError::Root {
            path: path.display().to_string(),
            source,
        })?;

        if !canonical.is_dir() {
            return Err(SandboxError::NotADirectory(
                canonical.display().to_string(),
            ));
        }

        Ok(Self(canonical))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve a model-supplied path against the root.
    ///
    /// Returns the absolute resolved path, or `SandboxError::Escape` when the
    /// result would fall outside the root. The prefix comparison is
    /// component-wise, so a sibling directory whose name merely extends the
    /// root's name (`/work` vs `/work2`) does not pass.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, SandboxError> {
        let candidate = normalize(&self.0.join(relative));
        let resolved = resolve_existing_prefix(&candidate);

        if resolved.starts_with(&self.0) {
            Ok(resolved)
        } else {
            Err(SandboxError::Escape(relative.to_string()))
        }
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding component.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let _ = normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Canonicalize the deepest existing ancestor of `candidate` and re-append
/// the components below it. Falls back to the lexical candidate when the
/// ancestor cannot be canonicalized.
fn resolve_existing_prefix(candidate: &Path) -> PathBuf {
    let mut existing = candidate.to_path_buf();
    let mut tail = Vec::new();

    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                tail.push(name.to_os_string());
                existing.pop();
            }
            None => break,
        }
    }

    let mut resolved = std::fs::canonicalize(&existing).unwrap_or(existing);
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    resolved
}
