//! storage layer for git-versioned
//!
//! this module is the only place that talks to git. The versioning engine
//! above it sees a repository as a small collaborator interface: stage a
//! path, commit everything dirty, list history, check paths out of an old
//! commit and look paths up inside a commit's tree.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GitRepository                           │
//! │  (add, commit_all, commits, checkout, lookup, is_dirty)     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   commit    │
//!                        │  (history)  │
//!                        └─────────────┘
//!  ```
//!
//! # Usage
//!
//! ```ignore
//! use git_versioned::storage::GitRepository;
//!
//! let repo = GitRepository::open_or_init("./records.git")?;
//! repo.add("Article/3f786850e387550fdab836ed7e6dc881de23001b")?;
//! let id = repo.commit_all("Committing changeset #1")?;
//! let history = repo.commits()?;
//! ```

mod commit;
mod error;
mod repository;
mod types;

// Re-export public API
pub use commit::CommitInfo;
pub use error::{StorageError, StorageResult};
pub use repository::GitRepository;
pub use types::{BlobId, CommitId, GitSignature, TreeId};
