//! git-versioned - versioned persistence for structured records, backed by Git
//!
//! Each record is snapshotted into one file of a Git working tree. Saving a
//! record rewrites its file, committing groups every pending change into a
//! numbered changeset, and reverting restores files (and the records that
//! were passed in) from an earlier commit.
//!
//! # Example
//!
//! ```no_run
//! use git_versioned::{Record, Versioning, VersioningConfig};
//!
//! let config = VersioningConfig::new("./records.git").track("Article");
//! let versioning = Versioning::open(config).unwrap();
//!
//! let article = Record::new("Article", "42").with("title", "Hello");
//! versioning.write(&article).unwrap();
//! versioning.commit(None, None).unwrap();
//! ```

pub mod config;
pub mod storage;
pub mod versioning;

pub use config::VersioningConfig;
pub use storage::{CommitId, CommitInfo, GitRepository, GitSignature};
pub use versioning::{
    Attributes, BlobPath, CommitMessage, Record, Versioned, Versioning, VersioningError,
    VersioningResult,
};
