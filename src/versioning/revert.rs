//! Revert manager.
//!
//! Reverting restores blobs from an earlier commit into the working tree and
//! reloads the affected records from the restored blobs. History itself is
//! never rewritten: HEAD stays where it is, and `revert_and_commit` appends
//! the restoration as a new commit.
//!
//! A checkout that fails part way leaves some paths restored and some not.
//! There is no rollback; running the same revert again completes it.

use std::fs;

use tracing::{debug, info, instrument};

use crate::storage::CommitId;
use crate::versioning::api::Versioning;
use crate::versioning::commit::CommitMessage;
use crate::versioning::error::{VersioningError, VersioningResult};
use crate::versioning::path::BlobPath;
use crate::versioning::record::Versioned;
use crate::versioning::snapshot;

impl Versioning {
    /// Restore records (or the whole tree) to `target`.
    ///
    /// With no target, the parent of HEAD is used, undoing the latest
    /// commit. With no records, every committed path is restored and nothing
    /// is reloaded: blobs added after `target` are removed, while blobs
    /// written but not yet committed stay on disk and pending. Records of
    /// untracked types are skipped. Returns the commit that was restored.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn revert(
        &self,
        records: &mut [&mut dyn Versioned],
        target: Option<CommitId>,
    ) -> VersioningResult<CommitId> {
        let target = self.resolve_target(target)?;

        let mut scope: Vec<(usize, BlobPath)> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if !self.is_tracked(record.type_name()) {
                debug!(type_name = record.type_name(), "skipping untracked record type");
                continue;
            }
            let path = BlobPath::for_record(&**record)?;
            if self.repo.lookup(target, &path.relative())?.is_none() {
                return Err(VersioningError::BlobNotFound {
                    type_name: record.type_name().to_string(),
                    record_id: record.record_id(),
                    commit: target.to_string(),
                });
            }
            scope.push((index, path));
        }

        if !records.is_empty() && scope.is_empty() {
            debug!("no versioned records in scope");
            return Ok(target);
        }

        let paths: Vec<String> = scope.iter().map(|(_, path)| path.relative()).collect();
        self.repo.checkout(target, &paths)?;

        let root = self.repo.path();
        for (index, path) in &scope {
            let bytes = fs::read(path.absolute(root))?;
            let attributes = snapshot::deserialize(&bytes)?;
            records[*index].restore_attributes(attributes)?;
        }

        if paths.is_empty() {
            info!(target = %target.short(), "reverted working tree");
        } else {
            info!(target = %target.short(), paths = paths.len(), "reverted records");
        }
        Ok(target)
    }

    /// Revert, then commit the restoration as a new snapshot whose summary
    /// names the commit that was HEAD before the revert.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn revert_and_commit(
        &self,
        records: &mut [&mut dyn Versioned],
        target: Option<CommitId>,
    ) -> VersioningResult<CommitId> {
        let former_head = self.repo.head()?.ok_or(VersioningError::NoHistory)?;
        self.revert(records, target)?;
        self.commit(None, Some(&CommitMessage::reverted(former_head)))
    }

    /// Revert to a textual revision (sha, abbreviated sha, `HEAD~2`, ...).
    pub fn revert_to(
        &self,
        rev: &str,
        records: &mut [&mut dyn Versioned],
    ) -> VersioningResult<CommitId> {
        let target = self.repo.resolve(rev)?;
        self.revert(records, Some(target))
    }

    fn resolve_target(&self, target: Option<CommitId>) -> VersioningResult<CommitId> {
        match target {
            Some(id) => {
                self.repo.get_commit(id)?;
                Ok(id)
            }
            None => {
                let head = self.repo.head()?.ok_or(VersioningError::NoHistory)?;
                self.repo
                    .get_commit(head)?
                    .first_parent()
                    .ok_or(VersioningError::NoHistory)
            }
        }
    }
}
