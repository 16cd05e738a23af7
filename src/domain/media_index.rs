use super::{Collection, DeleteTicket, IndexEntry};
use crate::error::{Result, SweeprError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// The shared, system-maintained media catalog.
///
/// Implementations own their storage; the resolver never caches anything
/// they return across calls.
pub trait MediaIndex: Send + Sync {
    /// Id of the row in `collection` whose stored absolute path equals `path`.
    fn query(&self, collection: Collection, path: &Path) -> Result<Option<u64>>;

    /// Unprivileged delete. Returns the number of rows actually removed.
    fn delete(&self, entries: &[IndexEntry]) -> Result<usize>;

    /// Ask the index authority for a ticket covering exactly `entries`.
    ///
    /// Indexes without owner-confirmed deletes return
    /// [`SweeprError::TicketUnsupported`].
    fn create_delete_request(&self, entries: &[IndexEntry]) -> Result<DeleteTicket>;
}

/// Maps an absolute path to the first index entry that stores it
#[derive(Clone)]
pub struct MediaIndexResolver {
    index: Arc<dyn MediaIndex>,
}

impl MediaIndexResolver {
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> Arc<dyn MediaIndex> {
        Arc::clone(&self.index)
    }

    /// Looks `path` up in images, video, audio, then the generic collection.
    /// The first match wins.
    pub fn locate(&self, path: &Path) -> Option<IndexEntry> {
        for collection in Collection::SEARCH_ORDER {
            match self.index.query(collection, path) {
                Ok(Some(id)) => {
                    debug!(path = %path.display(), %collection, id, "index match");
                    return Some(IndexEntry { id, collection });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), %collection, error = %e, "index query failed");
                }
            }
        }
        None
    }
}

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: u64,
    pub collection: Collection,
    pub path: PathBuf,
    /// Rows created by this app can be deleted without confirmation
    #[serde(default)]
    pub owned: bool,
}

impl CatalogRow {
    fn matches(&self, entry: &IndexEntry) -> bool {
        self.id == entry.id && self.collection == entry.collection
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    rows: Vec<CatalogRow>,
}

#[derive(Debug, Default)]
struct CatalogState {
    rows: Vec<CatalogRow>,
    tickets: HashMap<DeleteTicket, Vec<IndexEntry>>,
    next_ticket: u64,
}

/// File-backed [`MediaIndex`] that also plays the confirmation authority.
#[derive(Debug)]
pub struct CatalogIndex {
    state: Mutex<CatalogState>,
    tickets_supported: bool,
}

impl CatalogIndex {
    pub fn new(tickets_supported: bool) -> Self {
        Self::from_rows(Vec::new(), tickets_supported)
    }

    pub fn from_rows(rows: Vec<CatalogRow>, tickets_supported: bool) -> Self {
        Self {
            state: Mutex::new(CatalogState {
                rows,
                ..CatalogState::default()
            }),
            tickets_supported,
        }
    }

    /// Load a catalog from JSON. A missing file gives an empty catalog.
    pub fn load(path: &Path, tickets_supported: bool) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(tickets_supported));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            SweeprError::IndexError(format!("Failed to read catalog file: {}", e))
        })?;
        let file: CatalogFile = serde_json::from_str(&contents).map_err(|e| {
            SweeprError::IndexError(format!("Failed to parse catalog file: {}", e))
        })?;

        Ok(Self::from_rows(file.rows, tickets_supported))
    }

    /// Persist the rows. Outstanding tickets are not saved.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = CatalogFile {
            rows: self.rows()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SweeprError::IndexError(format!("Failed to create catalog directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(&file).map_err(|e| {
            SweeprError::IndexError(format!("Failed to serialize catalog: {}", e))
        })?;

        fs::write(path, contents).map_err(|e| {
            SweeprError::IndexError(format!("Failed to write catalog file: {}", e))
        })?;

        Ok(())
    }

    /// Add a row and return its id
    pub fn insert(
        &self,
        collection: Collection,
        path: impl Into<PathBuf>,
        owned: bool,
    ) -> Result<u64> {
        let mut state = self.state()?;
        let id = state.rows.iter().map(|row| row.id).max().map_or(1, |max| max + 1);
        state.rows.push(CatalogRow {
            id,
            collection,
            path: path.into(),
            owned,
        });
        Ok(id)
    }

    pub fn rows(&self) -> Result<Vec<CatalogRow>> {
        Ok(self.state()?.rows.clone())
    }

    pub fn pending_tickets(&self) -> Result<usize> {
        Ok(self.state()?.tickets.len())
    }

    /// Approve `ticket`: remove its rows and their files. Returns rows removed.
    pub fn commit_ticket(&self, ticket: &DeleteTicket) -> Result<usize> {
        let mut state = self.state()?;
        let entries = state
            .tickets
            .remove(ticket)
            .ok_or_else(|| SweeprError::UnknownTicket(ticket.to_string()))?;

        let state = &mut *state;
        match remove_rows(&mut state.rows, &entries, |_| true) {
            Ok(removed) => {
                info!(%ticket, removed, "ticket committed");
                Ok(removed)
            }
            Err(e) => {
                // Rows that survived stay claimed by the ticket so it can be retried
                let remaining: Vec<IndexEntry> = entries
                    .into_iter()
                    .filter(|entry| state.rows.iter().any(|row| row.matches(entry)))
                    .collect();
                state.tickets.insert(ticket.clone(), remaining);
                Err(e)
            }
        }
    }

    /// Drop a denied ticket without touching any row
    pub fn discard_ticket(&self, ticket: &DeleteTicket) -> Result<()> {
        self.state()?
            .tickets
            .remove(ticket)
            .map(|_| ())
            .ok_or_else(|| SweeprError::UnknownTicket(ticket.to_string()))
    }

    fn state(&self) -> Result<MutexGuard<'_, CatalogState>> {
        self.state
            .lock()
            .map_err(|_| SweeprError::IndexError("catalog lock poisoned".to_string()))
    }
}

impl MediaIndex for CatalogIndex {
    fn query(&self, collection: Collection, path: &Path) -> Result<Option<u64>> {
        let state = self.state()?;
        Ok(state
            .rows
            .iter()
            .find(|row| row.collection == collection && row.path.as_os_str() == path.as_os_str())
            .map(|row| row.id))
    }

    fn delete(&self, entries: &[IndexEntry]) -> Result<usize> {
        let mut state = self.state()?;
        remove_rows(&mut state.rows, entries, |row| row.owned)
    }

    fn create_delete_request(&self, entries: &[IndexEntry]) -> Result<DeleteTicket> {
        if !self.tickets_supported {
            return Err(SweeprError::TicketUnsupported);
        }

        let mut state = self.state()?;
        state.next_ticket += 1;
        let ticket = DeleteTicket::new(format!("catalog-ticket-{}", state.next_ticket));
        state.tickets.insert(ticket.clone(), entries.to_vec());
        Ok(ticket)
    }
}

/// Removes every row named by `entries` that `allowed` accepts, deleting the
/// backing file first. A file that is already gone still counts.
///
/// Stops at the first file that cannot be removed; rows handled before it stay
/// removed and the error says how many.
fn remove_rows(
    rows: &mut Vec<CatalogRow>,
    entries: &[IndexEntry],
    allowed: impl Fn(&CatalogRow) -> bool,
) -> Result<usize> {
    let mut removed = 0;
    for entry in entries {
        let position = rows
            .iter()
            .position(|row| row.matches(entry));
        let Some(position) = position else {
            continue;
        };
        if !allowed(&rows[position]) {
            continue;
        }

        match fs::remove_file(&rows[position].path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(SweeprError::IndexError(format!(
                    "removed {} of {} rows, then failed on {}: {}",
                    removed,
                    entries.len(),
                    entry,
                    e
                )))
            }
        }
        rows.remove(position);
        removed += 1;
    }
    Ok(removed)
}
