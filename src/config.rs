//! Configuration for a versioned repository.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::GitSignature;

/// Where records are versioned, who authors the commits, and which record
/// types take part.
///
/// Deserializable so host applications can load it from their own config
/// files; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Working tree root of the git repository.
    pub repository: PathBuf,
    /// Author identity applied to every commit.
    pub author_name: String,
    pub author_email: String,
    /// `save` writes the record's blob.
    pub auto_save: bool,
    /// `save` also commits after writing. Has no effect without `auto_save`.
    pub auto_commit: bool,
    /// Record types versioned in this repository.
    pub tracked_types: Vec<String>,
    /// Initialize the repository when it does not exist yet.
    pub create_if_missing: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            repository: PathBuf::from("acts_as_git_versioned.git"),
            author_name: GitSignature::DEFAULT_NAME.to_string(),
            author_email: GitSignature::DEFAULT_EMAIL.to_string(),
            auto_save: true,
            auto_commit: false,
            tracked_types: Vec::new(),
            create_if_missing: true,
        }
    }
}

impl VersioningConfig {
    /// Create a new configuration with the given repository path.
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            ..Default::default()
        }
    }

    /// Set the commit author.
    pub fn author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    /// Set auto_save flag.
    pub fn auto_save(mut self, value: bool) -> Self {
        self.auto_save = value;
        self
    }

    /// Set auto_commit flag.
    pub fn auto_commit(mut self, value: bool) -> Self {
        self.auto_commit = value;
        self
    }

    /// Add a record type to version.
    pub fn track(mut self, type_name: impl Into<String>) -> Self {
        self.tracked_types.push(type_name.into());
        self
    }

    /// Set create_if_missing flag.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// The author identity as a git signature.
    pub fn signature(&self) -> GitSignature {
        GitSignature::new(&self.author_name, &self.author_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VersioningConfig::default();
        assert_eq!(config.repository, PathBuf::from("acts_as_git_versioned.git"));
        assert!(config.auto_save);
        assert!(!config.auto_commit);
        assert!(config.create_if_missing);
        assert_eq!(config.signature(), GitSignature::default());
    }

    #[test]
    fn test_builder() {
        let config = VersioningConfig::new("/tmp/records")
            .author("Ada", "ada@example.com")
            .auto_commit(true)
            .track("Article")
            .track("Comment");

        assert_eq!(config.repository, PathBuf::from("/tmp/records"));
        assert_eq!(config.signature(), GitSignature::new("Ada", "ada@example.com"));
        assert!(config.auto_commit);
        assert_eq!(config.tracked_types, vec!["Article", "Comment"]);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: VersioningConfig = serde_json::from_str(
            r#"{"repository": "data/history.git", "auto_commit": true, "tracked_types": ["Article"]}"#,
        )
        .unwrap();

        assert_eq!(config.repository, PathBuf::from("data/history.git"));
        assert!(config.auto_commit);
        assert!(config.auto_save);
        assert_eq!(config.author_name, GitSignature::DEFAULT_NAME);
    }
}
