use super::classifier::PathClassifier;
use super::direct::{DeleteMode, DirectDeleter};
use super::gateway::{ConfirmationPolicy, ManagedDeleteGateway};
use super::media_index::{MediaIndex, MediaIndexResolver};
use super::tree::{DirectoryNode, TraversalLimits, TreeScopedDeleter};
use super::{Awaiting, ConfirmationResult, DeletionOutcome, FileTarget, IndexEntry, PendingDeletion};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Which tier a target belongs to, decided once per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Inside the private sandbox: direct filesystem delete
    Sandbox,
    /// Known to the media index
    Index(IndexEntry),
    /// Reachable only through a user-granted directory tree
    DirectoryGrant,
}

/// Ties the deletion tiers together.
///
/// Holds no mutable state, so one resolver can serve concurrent calls for
/// distinct targets.
#[derive(Clone)]
pub struct Resolver {
    classifier: PathClassifier,
    direct: DirectDeleter,
    media: MediaIndexResolver,
    gateway: ManagedDeleteGateway,
    tree: TreeScopedDeleter,
}

impl Resolver {
    /// Resolver with confirmation required, plain removal and default
    /// traversal limits
    pub fn new(sandbox_root: impl Into<PathBuf>, index: Arc<dyn MediaIndex>) -> Self {
        Self {
            classifier: PathClassifier::new(sandbox_root),
            direct: DirectDeleter::default(),
            media: MediaIndexResolver::new(Arc::clone(&index)),
            gateway: ManagedDeleteGateway::new(index, ConfirmationPolicy::default()),
            tree: TreeScopedDeleter::default(),
        }
    }

    pub fn with_confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.gateway = ManagedDeleteGateway::new(self.media_index(), policy);
        self
    }

    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.direct = DirectDeleter::new(mode);
        self
    }

    pub fn with_traversal_limits(mut self, limits: TraversalLimits) -> Self {
        self.tree = TreeScopedDeleter::new(limits);
        self
    }

    /// Decide the tier for `target` without touching anything
    pub fn plan(&self, target: &FileTarget) -> Plan {
        if self.classifier.is_sandbox_owned(target.path()) {
            return Plan::Sandbox;
        }

        match self.media.locate(target.path()) {
            Some(entry) => Plan::Index(entry),
            None => Plan::DirectoryGrant,
        }
    }

    /// Attempts each tier at most once and returns the first decisive outcome.
    pub fn resolve(&self, target: &FileTarget) -> DeletionOutcome {
        let plan = self.plan(target);
        debug!(%target, ?plan, "resolved deletion tier");

        match plan {
            Plan::Sandbox => {
                if self.direct.delete_direct(target.path()) {
                    DeletionOutcome::Deleted
                } else {
                    DeletionOutcome::failed("direct delete failed")
                }
            }
            Plan::Index(entry) => self.gateway.request_delete(&[entry]),
            Plan::DirectoryGrant => DeletionOutcome::NeedsDirectoryGrant,
        }
    }

    /// Resume a [`DeletionOutcome::NeedsDirectoryGrant`] with the tree the
    /// user granted.
    pub fn delete_with_grant(
        &self,
        tree_root: &dyn DirectoryNode,
        target: &FileTarget,
    ) -> DeletionOutcome {
        if self.tree.delete_in_tree(tree_root, target.name()) {
            DeletionOutcome::Deleted
        } else {
            DeletionOutcome::failed("no matching document in granted tree")
        }
    }

    fn media_index(&self) -> Arc<dyn MediaIndex> {
        self.media.index()
    }
}

/// Translate the confirmation authority's answer for a parked deletion.
///
/// Approval means the authority already removed the file; the index is not
/// polled again.
pub fn complete_confirmation(
    pending: &PendingDeletion,
    result: ConfirmationResult,
) -> DeletionOutcome {
    if pending.awaiting == Awaiting::DirectoryGrant {
        return DeletionOutcome::failed("deletion is waiting for a directory grant");
    }

    match result {
        ConfirmationResult::Approved => DeletionOutcome::Deleted,
        ConfirmationResult::Denied => DeletionOutcome::failed("deletion denied"),
        ConfirmationResult::AuthorityFailed(reason) => DeletionOutcome::failed(reason),
    }
}
