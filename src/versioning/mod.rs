//! The snapshot/versioning engine.
//!
//! Records are mapped to blobs in the working tree, written there on save,
//! committed in batches and restored from earlier commits.
//!
//! ```text
//!  record ──write──▶ <Type>/<idHash> ──commit──▶ changeset #n
//!     ▲                                              │
//!     └──────────────reload◀──checkout◀──revert──────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use git_versioned::{Record, Versioning, VersioningConfig};
//!
//! let versioning = Versioning::open(VersioningConfig::new("./records.git").track("Article"))?;
//!
//! let mut article = Record::new("Article", "42").with("title", "Hello");
//! versioning.write(&article)?;
//! versioning.commit(None, None)?;          // "Committing changeset #1"
//!
//! article.set("title", "Hello, world");
//! versioning.write(&article)?;
//! versioning.commit(Some("fix typo"), Some("Edit title"))?;
//!
//! versioning.revert(&mut [&mut article], None)?; // back to "Hello"
//! ```

mod api;
mod commit;
mod error;
mod history;
mod path;
mod record;
mod revert;
mod snapshot;
mod writer;

#[cfg(test)]
mod testing;

pub use api::Versioning;
pub use commit::CommitMessage;
pub use error::{InvalidNameError, VersioningError, VersioningResult};
pub use path::{BlobPath, RecordId, TypeName};
pub use record::{Record, Versioned};
pub use snapshot::{deserialize, from_attributes, serialize, to_attributes, Attributes};
