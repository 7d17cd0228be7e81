//! Read access to the snapshot history of records.

use std::path::PathBuf;

use crate::storage::{CommitId, CommitInfo};
use crate::versioning::api::Versioning;
use crate::versioning::error::VersioningResult;
use crate::versioning::path::BlobPath;
use crate::versioning::record::Versioned;
use crate::versioning::snapshot::{self, Attributes};

impl Versioning {
    /// All snapshots, most recent first.
    pub fn history(&self) -> VersioningResult<Vec<CommitInfo>> {
        Ok(self.repo.commits()?)
    }

    /// A record's attributes as stored in `at`, or None if the record had
    /// no blob there.
    pub fn read_at(&self, record: &dyn Versioned, at: CommitId) -> VersioningResult<Option<Attributes>> {
        let path = self.blob_path(record)?;
        self.read_path_at(&path, at)
    }

    /// Attributes stored at a blob path in `at`.
    pub fn read_path_at(&self, path: &BlobPath, at: CommitId) -> VersioningResult<Option<Attributes>> {
        match self.repo.read_blob_at(at, &path.relative())? {
            Some(bytes) => Ok(Some(snapshot::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Snapshots in which the record's blob was added or changed, most
    /// recent first.
    pub fn record_history(&self, record: &dyn Versioned) -> VersioningResult<Vec<CommitInfo>> {
        let target = PathBuf::from(self.blob_path(record)?.relative());

        let mut touched = Vec::new();
        for commit in self.repo.commits()? {
            let changed = self.repo.changed_paths(commit.first_parent(), commit.id)?;
            if changed.contains(&target) {
                touched.push(commit);
            }
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use crate::versioning::testing::{article, setup};
    use serde_json::json;

    #[test]
    fn test_read_at() {
        let (_dir, versioning) = setup();
        let mut record = article("1", "first");
        versioning.write(&record).unwrap();
        let c1 = versioning.commit(None, None).unwrap();

        record.set("title", "second, longer");
        versioning.write(&record).unwrap();
        let c2 = versioning.commit(None, None).unwrap();

        let old = versioning.read_at(&record, c1).unwrap().unwrap();
        let new = versioning.read_at(&record, c2).unwrap().unwrap();
        assert_eq!(old["title"], json!("first"));
        assert_eq!(new["title"], json!("second, longer"));

        let stranger = article("2", "never saved");
        assert!(versioning.read_at(&stranger, c2).unwrap().is_none());
    }

    #[test]
    fn test_record_history() {
        let (_dir, versioning) = setup();
        let mut a = article("a", "a1");
        let b = article("b", "b1");

        versioning.write(&a).unwrap();
        let c1 = versioning.commit(None, None).unwrap();
        versioning.write(&b).unwrap();
        versioning.commit(None, None).unwrap();
        a.set("title", "a2 changed");
        versioning.write(&a).unwrap();
        let c3 = versioning.commit(None, None).unwrap();

        let ids: Vec<_> = versioning.record_history(&a).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c3, c1]);
        assert_eq!(versioning.record_history(&b).unwrap().len(), 1);
        assert_eq!(versioning.history().unwrap().len(), 3);
    }
}
