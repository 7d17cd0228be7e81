//! Versioning error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for versioning operations.
pub type VersioningResult<T> = Result<T, VersioningError>;

/// Errors surfaced by the versioning engine.
///
/// Nothing here is retried or recovered internally; every error reaches the
/// caller as-is.
#[derive(Debug, Error)]
pub enum VersioningError {
    /// The record identity is empty or blank.
    #[error("invalid record identity: {0}")]
    InvalidIdentity(InvalidNameError),

    /// The record type name cannot be used as a directory name.
    #[error("invalid record type name: {0}")]
    InvalidTypeName(InvalidNameError),

    /// The record's type is not versioned by this repository.
    #[error("record type '{0}' is not tracked by this repository")]
    UntrackedType(String),

    /// Filesystem failure while writing or reading a blob.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Revert needs a commit before HEAD and there is none.
    #[error("no history: there is no earlier commit to revert to")]
    NoHistory,

    /// The revert target does not resolve to a commit.
    #[error("unknown commit: {0}")]
    UnknownCommit(String),

    /// A record in the revert scope has no blob in the target commit.
    #[error("no blob for {type_name} '{record_id}' at commit {commit}")]
    BlobNotFound {
        type_name: String,
        record_id: String,
        commit: String,
    },

    /// Blob content is not a valid snapshot document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The repository does not exist and creation was not requested.
    #[error("repository not found: {0}")]
    NotFound(PathBuf),

    /// Any other failure from the git engine.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for VersioningError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CommitNotFound(rev) => VersioningError::UnknownCommit(rev),
            StorageError::Io(e) => VersioningError::Io(e),
            other => VersioningError::Storage(other),
        }
    }
}

impl VersioningError {
    /// check if this error indicates a missing commit, blob or repository
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VersioningError::UnknownCommit(_)
                | VersioningError::BlobNotFound { .. }
                | VersioningError::NotFound(_)
                | VersioningError::NoHistory
        )
    }

    /// check if this error was caused by the caller's input rather than the
    /// repository state
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            VersioningError::InvalidIdentity(_)
                | VersioningError::InvalidTypeName(_)
                | VersioningError::UntrackedType(_)
        )
    }
}

/// error type for invalid record type names and identities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidStart(char),
    InvalidCharacter { char: char, position: usize },
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} characters", len),
            Self::InvalidStart(c) => write!(f, "name cannot start with '{}'", c),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character '{}' at position {}", char, position)
            }
        }
    }
}

impl std::error::Error for InvalidNameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_taxonomy() {
        let err: VersioningError = StorageError::CommitNotFound("deadbeef".into()).into();
        assert!(matches!(err, VersioningError::UnknownCommit(ref rev) if rev == "deadbeef"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: VersioningError = StorageError::Io(io).into();
        assert!(matches!(err, VersioningError::Io(_)));

        let err: VersioningError = StorageError::NotInitialized("missing".into()).into();
        assert!(matches!(err, VersioningError::Storage(_)));
    }

    #[test]
    fn test_error_classification() {
        assert!(VersioningError::NoHistory.is_not_found());
        assert!(!VersioningError::NoHistory.is_caller_error());

        let invalid = VersioningError::InvalidIdentity(InvalidNameError::Empty);
        assert!(invalid.is_caller_error());
        assert!(!invalid.is_not_found());
        assert_eq!(invalid.to_string(), "invalid record identity: name cannot be empty");
    }
}
