//! End-to-end behaviour of the versioning engine through the public API.

use std::fs;

use git_versioned::versioning::{from_attributes, to_attributes};
use git_versioned::{
    Attributes, BlobPath, Versioned, Versioning, VersioningConfig, VersioningError,
    VersioningResult,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// An application record: the id lives outside the attribute map and the
/// rendered body is transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Article {
    #[serde(skip)]
    id: u64,
    title: String,
    tags: Vec<String>,
    #[serde(skip)]
    rendered: Option<String>,
}

impl Article {
    fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            tags: Vec::new(),
            rendered: None,
        }
    }
}

impl Versioned for Article {
    fn type_name(&self) -> &str {
        "Article"
    }

    fn record_id(&self) -> String {
        self.id.to_string()
    }

    fn attributes(&self) -> VersioningResult<Attributes> {
        to_attributes(self)
    }

    fn restore_attributes(&mut self, attributes: Attributes) -> VersioningResult<()> {
        let restored: Article = from_attributes(attributes)?;
        self.title = restored.title;
        self.tags = restored.tags;
        self.rendered = None;
        Ok(())
    }
}

fn open(dir: &TempDir) -> Versioning {
    let config = VersioningConfig::new(dir.path().join("history.git"))
        .author("Editor", "editor@example.com")
        .track("Article");
    Versioning::open(config).unwrap()
}

#[test]
fn write_commit_and_revert_typed_records() {
    let dir = TempDir::new().unwrap();
    let versioning = open(&dir);

    let mut article = Article::new(7, "Draft");
    article.rendered = Some("<h1>Draft</h1>".to_string());
    versioning.write(&article).unwrap();
    let c1 = versioning.commit(None, None).unwrap();

    article.title = "Published title".to_string();
    article.tags.push("news".to_string());
    versioning.write(&article).unwrap();
    versioning.commit(Some("Ready for the front page."), Some("Publish")).unwrap();

    let blob = BlobPath::resolve("Article", "7").unwrap();
    let text = fs::read_to_string(blob.absolute(versioning.repository().path())).unwrap();
    assert!(text.starts_with("{\n  \"attributes\": {"));
    assert!(!text.contains("rendered"));

    versioning.revert(&mut [&mut article], None).unwrap();
    assert_eq!(article.title, "Draft");
    assert!(article.tags.is_empty());
    assert_eq!(article.rendered, None);

    let stored = versioning.read_at(&article, c1).unwrap().unwrap();
    assert_eq!(stored, article.attributes().unwrap());
}

#[test]
fn history_survives_reopening() {
    let dir = TempDir::new().unwrap();
    {
        let versioning = open(&dir);
        versioning.write(&Article::new(1, "One")).unwrap();
        versioning.commit(None, None).unwrap();
    }

    let versioning = open(&dir);
    versioning.write(&Article::new(2, "Two")).unwrap();
    let id = versioning.commit(None, None).unwrap();

    let info = versioning.repository().get_commit(id).unwrap();
    assert_eq!(info.message, "Committing changeset #2");
    assert_eq!(info.author_name, "Editor");
    assert_eq!(versioning.history().unwrap().len(), 2);
}

#[test]
fn revert_and_commit_appends_history() {
    let dir = TempDir::new().unwrap();
    let versioning = open(&dir);

    let mut article = Article::new(3, "Original");
    versioning.write(&article).unwrap();
    versioning.commit(None, None).unwrap();

    article.title = "Vandalised beyond recognition".to_string();
    versioning.write(&article).unwrap();
    let bad = versioning.commit(None, None).unwrap();

    let fixed = versioning.revert_and_commit(&mut [], None).unwrap();
    let info = versioning.repository().get_commit(fixed).unwrap();
    assert_eq!(info.message, format!("Reverted commit {}", bad));

    // whole-tree revert leaves the in-memory record alone; reload it
    assert_eq!(article.title, "Vandalised beyond recognition");
    let stored = versioning.read_at(&article, fixed).unwrap().unwrap();
    article.restore_attributes(stored).unwrap();
    assert_eq!(article.title, "Original");

    // undoing the revert brings the change back
    versioning.revert(&mut [&mut article], None).unwrap();
    assert_eq!(article.title, "Vandalised beyond recognition");
}

#[test]
fn corrupted_blob_surfaces_serialization_error() {
    let dir = TempDir::new().unwrap();
    let versioning = open(&dir);

    let mut article = Article::new(9, "Fine");
    let blob = versioning.write(&article).unwrap();
    versioning.commit(None, None).unwrap();

    fs::write(blob.absolute(versioning.repository().path()), "attributes: [broken\n").unwrap();
    let bad = versioning.commit(None, None).unwrap();
    versioning.commit(None, None).unwrap();

    let result = versioning.revert(&mut [&mut article], Some(bad));
    assert!(matches!(result, Err(VersioningError::Serialization(_))));
}
