//! Versioning handle - the entry point for record snapshots.

use std::collections::BTreeSet;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::VersioningConfig;
use crate::storage::GitRepository;
use crate::versioning::error::{VersioningError, VersioningResult};
use crate::versioning::path::{BlobPath, TypeName};
use crate::versioning::record::Versioned;

/// Versions records of the tracked types in one git repository.
///
/// The handle owns the repository reference explicitly; there is no global
/// per-type state. Several record types may share one repository, and
/// commits always include every dirty tracked path under the root, not only
/// the paths written through this handle.
///
/// Nothing here locks the repository directory against other processes:
/// callers that need several writers must serialize access per repository
/// root themselves.
pub struct Versioning {
    pub(crate) config: VersioningConfig,
    pub(crate) repo: GitRepository,
    tracked: RwLock<BTreeSet<TypeName>>,
    /// Blobs written since the last successful commit.
    pub(crate) pending: Mutex<BTreeSet<BlobPath>>,
}

impl Versioning {
    /// Open (or create, if configured) the repository and apply the author
    /// identity.
    pub fn open(config: VersioningConfig) -> VersioningResult<Self> {
        let repo = if config.create_if_missing {
            GitRepository::open_or_init(&config.repository)?
        } else if config.repository.join(".git").exists() {
            GitRepository::open(&config.repository)?
        } else {
            return Err(VersioningError::NotFound(config.repository.clone()));
        };

        Self::with_repository(repo, config)
    }

    /// Build a handle over an already opened repository.
    pub fn with_repository(repo: GitRepository, config: VersioningConfig) -> VersioningResult<Self> {
        let tracked = config
            .tracked_types
            .iter()
            .map(|name| TypeName::new(name.as_str()).map_err(VersioningError::InvalidTypeName))
            .collect::<VersioningResult<BTreeSet<_>>>()?;

        repo.set_signature(config.signature());
        info!(
            repository = %repo.path().display(),
            types = tracked.len(),
            "opened versioned repository"
        );

        Ok(Self {
            config,
            repo,
            tracked: RwLock::new(tracked),
            pending: Mutex::new(BTreeSet::new()),
        })
    }

    /// The underlying repository.
    pub fn repository(&self) -> &GitRepository {
        &self.repo
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Start versioning another record type.
    pub fn track(&self, type_name: &str) -> VersioningResult<()> {
        let type_name = TypeName::new(type_name).map_err(VersioningError::InvalidTypeName)?;
        if self.tracked.write().insert(type_name.clone()) {
            debug!(%type_name, "tracking record type");
        }
        Ok(())
    }

    /// Whether records of this type take part in versioning here.
    pub fn is_tracked(&self, type_name: &str) -> bool {
        TypeName::new(type_name)
            .map(|name| self.tracked.read().contains(&name))
            .unwrap_or(false)
    }

    /// Tracked record types, sorted.
    pub fn tracked_types(&self) -> Vec<TypeName> {
        self.tracked.read().iter().cloned().collect()
    }

    /// Blob path of a record of a tracked type.
    pub fn blob_path(&self, record: &dyn Versioned) -> VersioningResult<BlobPath> {
        let path = BlobPath::for_record(record)?;
        if !self.tracked.read().contains(path.type_name()) {
            return Err(VersioningError::UntrackedType(record.type_name().to_string()));
        }
        Ok(path)
    }
}
