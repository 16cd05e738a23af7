//! Error types shared by the collaborator seams

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweeprError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Index error: {0}")]
    IndexError(String),

    /// The index cannot issue deletion tickets on this platform
    #[error("Deletion tickets are not supported by this index")]
    TicketUnsupported,

    #[error("Unknown deletion ticket: {0}")]
    UnknownTicket(String),

    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, SweeprError>;
