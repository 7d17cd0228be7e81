//! Commit manager.
//!
//! A commit snapshots every dirty tracked path under the repository root,
//! including changes made by other record types or other tools sharing the
//! repository. Calling [`Versioning::commit`] with nothing to commit still
//! produces a commit with an unchanged tree; [`Versioning::commit_if_dirty`]
//! is the guarded variant.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use crate::storage::CommitId;
use crate::versioning::api::Versioning;
use crate::versioning::error::VersioningResult;
use crate::versioning::path::BlobPath;

/// message formatting for snapshot commits
pub struct CommitMessage;

impl CommitMessage {
    /// summary used when the caller gives none
    pub fn default_summary(sequence: usize) -> String {
        format!("Committing changeset #{}", sequence)
    }

    /// summary line, then a blank line and the body if there is one
    pub fn compose(sequence: usize, summary: Option<&str>, body: Option<&str>) -> String {
        let mut message = match non_blank(summary) {
            Some(summary) => summary.to_string(),
            None => Self::default_summary(sequence),
        };
        if let Some(body) = non_blank(body) {
            message.push_str("\n\n");
            message.push_str(body);
        }
        message
    }

    /// summary for a commit that undoes `commit`
    pub fn reverted(commit: CommitId) -> String {
        format!("Reverted commit {}", commit)
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

impl Versioning {
    /// Commit all outstanding changes as the next changeset.
    ///
    /// `message` is the optional body, `summary` the optional first line.
    /// The sequence number is read from the repository on every call.
    #[instrument(skip(self))]
    pub fn commit(&self, message: Option<&str>, summary: Option<&str>) -> VersioningResult<CommitId> {
        let mut pending = self.pending.lock();
        self.stage_pending(&pending)?;
        self.commit_staged(&mut pending, message, summary)
    }

    /// Like [`commit`](Versioning::commit), but returns `None` without
    /// committing when nothing differs from HEAD.
    #[instrument(skip(self))]
    pub fn commit_if_dirty(
        &self,
        message: Option<&str>,
        summary: Option<&str>,
    ) -> VersioningResult<Option<CommitId>> {
        let mut pending = self.pending.lock();
        self.stage_pending(&pending)?;

        if !self.repo.is_dirty()? {
            pending.clear();
            debug!("nothing to commit");
            return Ok(None);
        }
        self.commit_staged(&mut pending, message, summary).map(Some)
    }

    /// Whether blobs were written since the last commit.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Blobs written since the last commit, sorted.
    pub fn pending_paths(&self) -> Vec<BlobPath> {
        self.pending.lock().iter().cloned().collect()
    }

    /// Re-stage blobs written by this handle so the index holds their
    /// latest content.
    fn stage_pending(&self, pending: &BTreeSet<BlobPath>) -> VersioningResult<()> {
        let root = self.repo.path();
        for path in pending {
            if path.absolute(root).is_file() {
                self.repo.add(&path.relative())?;
            }
        }
        Ok(())
    }

    fn commit_staged(
        &self,
        pending: &mut BTreeSet<BlobPath>,
        message: Option<&str>,
        summary: Option<&str>,
    ) -> VersioningResult<CommitId> {
        let sequence = self.repo.commit_count()? + 1;
        let text = CommitMessage::compose(sequence, summary, message);

        let id = self.repo.commit_all(&text)?;
        let written = pending.len();
        pending.clear();

        info!(commit = %id.short(), sequence, written, "committed changeset");
        Ok(id)
    }
}
