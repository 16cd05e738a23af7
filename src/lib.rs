//! Sweepr - deletion resolution for files the app may not own
//!
//! Given a path, this crate decides how it can legally be deleted: directly
//! from the app sandbox, through the shared media index (possibly pending an
//! external confirmation), or through a directory tree the user granted.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod worker;

// Re-export primary types for convenience
pub use config::UserConfig;
pub use domain::{
    complete_confirmation, ConfirmationResult, DeletionOutcome, DeletionStatistics, FileTarget,
    PendingDeletion, Plan, Resolver,
};
pub use error::{Result, SweeprError};
pub use worker::{DeletionWorker, SyncDeletionWorker};
