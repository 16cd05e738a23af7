//! Data model for deletion resolution
//!
//! A [`FileTarget`] goes into the [`Resolver`], a [`DeletionOutcome`] comes out.
//! Non-terminal outcomes are parked by the caller in a [`PendingDeletion`]
//! until the external authority or folder picker reports back.

pub mod classifier;
pub mod direct;
pub mod gateway;
pub mod media_index;
pub mod resolver;
pub mod tree;

pub use classifier::PathClassifier;
pub use direct::{DeleteMode, DirectDeleter};
pub use gateway::{ConfirmationPolicy, ManagedDeleteGateway};
pub use media_index::{CatalogIndex, CatalogRow, MediaIndex, MediaIndexResolver};
pub use resolver::{complete_confirmation, Plan, Resolver};
pub use tree::{DirectoryNode, FsDirectoryNode, TraversalLimits, TreeScopedDeleter};

use crate::error::{Result, SweeprError};
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// An absolute path selected for deletion, plus its basename.
///
/// The basename keeps the platform's raw bytes so it can be compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileTarget {
    path: PathBuf,
    name: OsString,
}

impl FileTarget {
    /// Build a target from an absolute path.
    ///
    /// Relative paths and paths without a final component (such as `/`) are
    /// rejected.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(SweeprError::InvalidPath(path));
        }

        let name = match path.file_name() {
            Some(name) => name.to_os_string(),
            None => return Err(SweeprError::InvalidPath(path)),
        };

        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }
}

impl fmt::Display for FileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Collections of the shared media index, in lookup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Images,
    Video,
    Audio,
    /// Catch-all for file kinds without a typed collection
    Files,
}

impl Collection {
    /// Typed collections first, the generic one last
    pub const SEARCH_ORDER: [Collection; 4] = [
        Collection::Images,
        Collection::Video,
        Collection::Audio,
        Collection::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Images => "images",
            Collection::Video => "video",
            Collection::Audio => "audio",
            Collection::Files => "files",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the media index that matched a target path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: u64,
    pub collection: Collection,
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Opaque token for a delete request awaiting external confirmation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeleteTicket(String);

impl DeleteTicket {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeleteTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one resolution step.
///
/// Every variant implies a different caller action: remove the list entry,
/// launch the confirmation UI, launch the folder picker, or show an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The target is gone
    Deleted,
    /// The index holds the delete until an external authority approves `ticket`
    NeedsExternalConfirmation {
        ticket: DeleteTicket,
        affected_items: Vec<IndexEntry>,
    },
    /// Only reachable through a user-granted directory tree
    NeedsDirectoryGrant,
    /// Terminal failure; `reason` is diagnostic only
    Failed { reason: String },
}

impl DeletionOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        DeletionOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the caller is done with this target
    pub fn is_terminal(&self) -> bool {
        match self {
            DeletionOutcome::Deleted | DeletionOutcome::Failed { .. } => true,
            DeletionOutcome::NeedsExternalConfirmation { .. }
            | DeletionOutcome::NeedsDirectoryGrant => false,
        }
    }
}

/// What the external confirmation authority reported for a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationResult {
    Approved,
    Denied,
    AuthorityFailed(String),
}

/// What a pending deletion is waiting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Awaiting {
    Confirmation {
        ticket: DeleteTicket,
        affected_items: Vec<IndexEntry>,
    },
    DirectoryGrant,
}

/// Caller-held record tying an in-flight target to its list position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub target: FileTarget,
    pub position: usize,
    pub awaiting: Awaiting,
}

impl PendingDeletion {
    /// Park a non-terminal outcome. Terminal outcomes yield `None`.
    pub fn from_outcome(
        target: FileTarget,
        position: usize,
        outcome: &DeletionOutcome,
    ) -> Option<Self> {
        let awaiting = match outcome {
            DeletionOutcome::NeedsExternalConfirmation {
                ticket,
                affected_items,
            } => Awaiting::Confirmation {
                ticket: ticket.clone(),
                affected_items: affected_items.clone(),
            },
            DeletionOutcome::NeedsDirectoryGrant => Awaiting::DirectoryGrant,
            DeletionOutcome::Deleted | DeletionOutcome::Failed { .. } => return None,
        };

        Some(Self {
            target,
            position,
            awaiting,
        })
    }

    pub fn ticket(&self) -> Option<&DeleteTicket> {
        match &self.awaiting {
            Awaiting::Confirmation { ticket, .. } => Some(ticket),
            Awaiting::DirectoryGrant => None,
        }
    }
}

/// Tally of outcomes over a batch of independently resolved targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionStatistics {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
    pub pending: usize,
}

impl DeletionStatistics {
    pub fn record(&mut self, outcome: &DeletionOutcome) {
        self.total += 1;
        match outcome {
            DeletionOutcome::Deleted => self.deleted += 1,
            DeletionOutcome::Failed { .. } => self.failed += 1,
            DeletionOutcome::NeedsExternalConfirmation { .. }
            | DeletionOutcome::NeedsDirectoryGrant => self.pending += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_outcome() -> DeletionOutcome {
        DeletionOutcome::NeedsExternalConfirmation {
            ticket: DeleteTicket::new("t-1"),
            affected_items: vec![IndexEntry {
                id: 7,
                collection: Collection::Images,
            }],
        }
    }

    #[test]
    fn test_file_target_derives_name() {
        let target = FileTarget::new("/shared/Pictures/img.jpg").unwrap();
        assert_eq!(target.name(), "img.jpg");
        assert_eq!(target.path(), Path::new("/shared/Pictures/img.jpg"));
    }

    #[test]
    fn test_file_target_rejects_relative_path() {
        let result = FileTarget::new("Pictures/img.jpg");
        assert!(matches!(result, Err(SweeprError::InvalidPath(_))));
    }

    #[test]
    fn test_file_target_rejects_root() {
        assert!(FileTarget::new("/").is_err());
    }

    #[test]
    fn test_collection_search_order() {
        assert_eq!(
            Collection::SEARCH_ORDER,
            [
                Collection::Images,
                Collection::Video,
                Collection::Audio,
                Collection::Files
            ]
        );
    }

    #[test]
    fn test_collection_serializes_lowercase() {
        let json = serde_json::to_string(&Collection::Images).unwrap();
        assert_eq!(json, "\"images\"");
    }

    #[test]
    fn test_outcome_terminality() {
        assert!(DeletionOutcome::Deleted.is_terminal());
        assert!(DeletionOutcome::failed("x").is_terminal());
        assert!(!DeletionOutcome::NeedsDirectoryGrant.is_terminal());
        assert!(!ticket_outcome().is_terminal());
    }

    #[test]
    fn test_pending_from_terminal_outcome_is_none() {
        let target = FileTarget::new("/a/b.txt").unwrap();
        assert!(PendingDeletion::from_outcome(target.clone(), 0, &DeletionOutcome::Deleted)
            .is_none());
        assert!(
            PendingDeletion::from_outcome(target, 0, &DeletionOutcome::failed("nope")).is_none()
        );
    }

    #[test]
    fn test_pending_from_confirmation_keeps_ticket() {
        let target = FileTarget::new("/shared/Pictures/img.jpg").unwrap();
        let pending = PendingDeletion::from_outcome(target, 3, &ticket_outcome()).unwrap();

        assert_eq!(pending.position, 3);
        assert_eq!(pending.ticket(), Some(&DeleteTicket::new("t-1")));
    }

    #[test]
    fn test_pending_from_grant_has_no_ticket() {
        let target = FileTarget::new("/shared/Documents/report.pdf").unwrap();
        let pending =
            PendingDeletion::from_outcome(target, 0, &DeletionOutcome::NeedsDirectoryGrant)
                .unwrap();

        assert_eq!(pending.awaiting, Awaiting::DirectoryGrant);
        assert!(pending.ticket().is_none());
    }

    #[test]
    fn test_statistics_record() {
        let mut stats = DeletionStatistics::default();
        stats.record(&DeletionOutcome::Deleted);
        stats.record(&DeletionOutcome::failed("x"));
        stats.record(&DeletionOutcome::NeedsDirectoryGrant);
        stats.record(&ticket_outcome());

        assert_eq!(
            stats,
            DeletionStatistics {
                total: 4,
                deleted: 1,
                failed: 1,
                pending: 2,
            }
        );
    }
}
