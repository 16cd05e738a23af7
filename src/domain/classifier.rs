use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Decides whether a path lives inside the application's private storage.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    sandbox_root: PathBuf,
}

impl PathClassifier {
    pub fn new(sandbox_root: impl Into<PathBuf>) -> Self {
        Self {
            sandbox_root: sandbox_root.into(),
        }
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// Returns true iff the canonical form of `path` sits under the canonical
    /// sandbox root. Any resolution failure answers `false`.
    pub fn is_sandbox_owned(&self, path: &Path) -> bool {
        let root = match canonical_form(&self.sandbox_root) {
            Some(root) => root,
            None => {
                debug!(root = %self.sandbox_root.display(), "sandbox root does not resolve");
                return false;
            }
        };

        match canonical_form(path) {
            Some(candidate) => candidate.starts_with(&root),
            None => {
                debug!(path = %path.display(), "path does not resolve");
                false
            }
        }
    }
}

/// Symlink-resolved absolute form of `path`.
///
/// Paths that no longer exist resolve through their deepest existing
/// ancestor, with the missing tail appended as-is. A missing tail that
/// contains `.` or `..` cannot be resolved.
fn canonical_form(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;

    if let Ok(resolved) = fs::canonicalize(&absolute) {
        return Some(resolved);
    }

    let mut missing = Vec::new();
    let mut current = absolute.as_path();
    loop {
        match current.components().next_back()? {
            Component::Normal(name) => missing.push(name.to_os_string()),
            _ => return None,
        }
        current = current.parent()?;

        if let Ok(mut resolved) = fs::canonicalize(current) {
            for name in missing.iter().rev() {
                resolved.push(name);
            }
            return Some(resolved);
        }
    }
}
