//! Storage layer error types
//!
//! All errors that can occur while talking to the git engine are defined here.

use std::path::PathBuf;

use thiserror::Error;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// error from the underlying Git library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// repo is not initialized
    #[error("repository not initialized: {0}")]
    NotInitialized(PathBuf),

    /// the commit (or revision) could not be resolved
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// path is not usable inside the working tree
    #[error("invalid repository path: {0}")]
    InvalidPath(PathBuf),
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
