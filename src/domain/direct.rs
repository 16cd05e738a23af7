use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// How the direct tier disposes of a path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Unlink from the filesystem
    #[default]
    Remove,
    /// Move to the desktop trash
    Trash,
}

/// Unprivileged delete for sandbox-owned paths
#[derive(Debug, Clone, Default)]
pub struct DirectDeleter {
    mode: DeleteMode,
}

impl DirectDeleter {
    pub fn new(mode: DeleteMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DeleteMode {
        self.mode
    }

    /// Deletes `path` (with its full subtree for directories).
    ///
    /// Returns false on any I/O error. Symlinks are removed, not followed.
    pub fn delete_direct(&self, path: &Path) -> bool {
        match self.try_delete(path) {
            Ok(()) => {
                info!(path = %path.display(), mode = ?self.mode, "deleted directly");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "direct delete failed");
                false
            }
        }
    }

    fn try_delete(&self, path: &Path) -> io::Result<()> {
        let metadata = fs::symlink_metadata(path)?;

        match self.mode {
            DeleteMode::Remove if metadata.is_dir() => fs::remove_dir_all(path),
            DeleteMode::Remove => fs::remove_file(path),
            DeleteMode::Trash => trash::delete(path).map_err(|e| io::Error::other(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("doc.txt");
        fs::write(&file_path, b"content").unwrap();

        assert!(DirectDeleter::default().delete_direct(&file_path));
        assert!(!file_path.exists());
    }

    #[test]
    fn test_delete_directory_subtree() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("app");
        fs::create_dir_all(dir.join("nested").join("deeper")).unwrap();
        fs::write(dir.join("a.txt"), b"a").unwrap();
        fs::write(dir.join("nested").join("deeper").join("b.txt"), b"b").unwrap();

        assert!(DirectDeleter::default().delete_direct(&dir));
        assert!(!dir.exists());
    }

    #[test]
    fn test_delete_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nonexistent.txt");

        assert!(!DirectDeleter::default().delete_direct(&missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_symlink_keeps_link_target() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("keep.txt"), b"keep").unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert!(DirectDeleter::default().delete_direct(&link));
        assert!(!link.exists());
        assert!(real.join("keep.txt").exists());
    }

    #[test]
    fn test_default_mode_is_remove() {
        assert_eq!(DirectDeleter::default().mode(), DeleteMode::Remove);
    }
}
