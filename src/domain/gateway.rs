use super::media_index::MediaIndex;
use super::{DeletionOutcome, IndexEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether the index enforces per-owner write protection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationPolicy {
    /// Deletes go through a ticket confirmed out of process
    #[default]
    Required,
    NotRequired,
}

/// Deletes index entries, directly or through an external confirmation
#[derive(Clone)]
pub struct ManagedDeleteGateway {
    index: Arc<dyn MediaIndex>,
    policy: ConfirmationPolicy,
}

impl ManagedDeleteGateway {
    pub fn new(index: Arc<dyn MediaIndex>, policy: ConfirmationPolicy) -> Self {
        Self { index, policy }
    }

    /// Requests deletion of exactly `entries`.
    ///
    /// Under [`ConfirmationPolicy::Required`] this asks for a ticket and hands
    /// it back without deleting anything. When ticketing is unavailable, or
    /// not required, the index's unprivileged delete is attempted once.
    pub fn request_delete(&self, entries: &[IndexEntry]) -> DeletionOutcome {
        if entries.is_empty() {
            return DeletionOutcome::failed("no index entries to delete");
        }

        if self.policy == ConfirmationPolicy::Required {
            match self.index.create_delete_request(entries) {
                Ok(ticket) => {
                    debug!(%ticket, items = entries.len(), "deletion ticket issued");
                    return DeletionOutcome::NeedsExternalConfirmation {
                        ticket,
                        affected_items: entries.to_vec(),
                    };
                }
                Err(e) => {
                    warn!(error = %e, "ticket issuance failed, trying unprivileged delete");
                }
            }
        }

        self.delete_unprivileged(entries)
    }

    fn delete_unprivileged(&self, entries: &[IndexEntry]) -> DeletionOutcome {
        match self.index.delete(entries) {
            Ok(0) => DeletionOutcome::failed("no rows removed"),
            Ok(removed) => {
                info!(removed, "index rows deleted");
                DeletionOutcome::Deleted
            }
            Err(e) => DeletionOutcome::failed(e.to_string()),
        }
    }
}
