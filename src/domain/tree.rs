use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A node of a user-granted directory tree.
///
/// The tree belongs to the provider that granted it; the deleter only reads
/// it for the duration of one search and deletes at most one leaf.
pub trait DirectoryNode: Send {
    /// Raw entry name, compared byte for byte against the target's basename
    fn name(&self) -> &OsStr;

    fn is_container(&self) -> bool;

    /// Direct children in the provider's native enumeration order
    fn children(&self) -> io::Result<Vec<Box<dyn DirectoryNode>>>;

    fn delete(&self) -> io::Result<()>;
}

/// Caps on how much of an externally supplied tree is walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalLimits {
    /// Containers at this depth are not expanded; the root's children are depth 1
    pub max_depth: usize,
    /// Nodes visited before the walk stops
    pub max_nodes: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 100_000,
        }
    }
}

/// Finds a document by name inside a granted tree and deletes it
#[derive(Debug, Clone, Default)]
pub struct TreeScopedDeleter {
    limits: TraversalLimits,
}

impl TreeScopedDeleter {
    pub fn new(limits: TraversalLimits) -> Self {
        Self { limits }
    }

    /// Deletes the first leaf named exactly `target_name`, depth-first and
    /// pre-order. Containers are never selected.
    ///
    /// Returns true only if the selected leaf reports a successful delete.
    pub fn delete_in_tree(&self, tree_root: &dyn DirectoryNode, target_name: &OsStr) -> bool {
        if !tree_root.is_container() {
            warn!(root = ?tree_root.name(), "granted root is not a directory");
            return false;
        }

        let children = match tree_root.children() {
            Ok(children) => children,
            Err(e) => {
                warn!(root = ?tree_root.name(), error = %e, "cannot open granted tree");
                return false;
            }
        };

        let mut candidates = self.collect_candidates(children, target_name).into_iter();
        let Some(selected) = candidates.next() else {
            debug!(?target_name, "no matching document in granted tree");
            return false;
        };

        let others = candidates.count();
        if others > 0 {
            // Same-named files in different subfolders are not disambiguated.
            warn!(?target_name, others, "several documents match, deleting the first");
        }

        match selected.delete() {
            Ok(()) => {
                info!(?target_name, "deleted through directory grant");
                true
            }
            Err(e) => {
                warn!(?target_name, error = %e, "tree node delete failed");
                false
            }
        }
    }

    /// Walks the whole tree (within limits) and returns every matching leaf
    /// in pre-order.
    fn collect_candidates(
        &self,
        roots: Vec<Box<dyn DirectoryNode>>,
        target_name: &OsStr,
    ) -> Vec<Box<dyn DirectoryNode>> {
        let mut candidates = Vec::new();
        let mut stack: Vec<(Box<dyn DirectoryNode>, usize)> =
            roots.into_iter().rev().map(|node| (node, 1)).collect();
        let mut visited = 0;

        while let Some((node, depth)) = stack.pop() {
            visited += 1;
            if visited > self.limits.max_nodes {
                warn!(max_nodes = self.limits.max_nodes, "tree node limit reached");
                break;
            }

            if !node.is_container() {
                if node.name() == target_name {
                    candidates.push(node);
                }
                continue;
            }

            if depth >= self.limits.max_depth {
                debug!(dir = ?node.name(), depth, "tree depth limit reached");
                continue;
            }

            match node.children() {
                Ok(children) => {
                    stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
                }
                Err(e) => warn!(dir = ?node.name(), error = %e, "skipping unreadable directory"),
            }
        }

        candidates
    }
}

/// [`DirectoryNode`] over a real directory. The granted root may be a
/// symlink; symlinks below it are leaves.
#[derive(Debug, Clone)]
pub struct FsDirectoryNode {
    path: PathBuf,
    name: OsString,
    is_dir: bool,
}

impl FsDirectoryNode {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let is_dir = fs::metadata(&path)?.is_dir();
        let name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| path.clone().into_os_string());

        Ok(Self { path, name, is_dir })
    }
}

impl DirectoryNode for FsDirectoryNode {
    fn name(&self) -> &OsStr {
        &self.name
    }

    fn is_container(&self) -> bool {
        self.is_dir
    }

    fn children(&self) -> io::Result<Vec<Box<dyn DirectoryNode>>> {
        let mut children: Vec<Box<dyn DirectoryNode>> = Vec::new();

        for entry_result in fs::read_dir(&self.path)? {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue,
            };
            let is_dir = match entry.file_type() {
                Ok(file_type) => file_type.is_dir(),
                Err(_) => continue,
            };

            children.push(Box::new(FsDirectoryNode {
                path: entry.path(),
                name: entry.file_name(),
                is_dir,
            }));
        }

        Ok(children)
    }

    fn delete(&self) -> io::Result<()> {
        if self.is_dir {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to delete directory {}", self.path.display()),
            ));
        }
        fs::remove_file(&self.path)
    }
}
