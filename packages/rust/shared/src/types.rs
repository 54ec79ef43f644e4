//! Core domain types for readmegen repository contexts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FileContext
// ---------------------------------------------------------------------------

/// A single retained source file: relative path, base name, and text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    /// Path relative to the repository root, using `/` separators.
    pub path: String,
    /// File base name (last path component).
    pub name: String,
    /// UTF-8 file content. Binary files are never retained.
    pub content: String,
}

// ---------------------------------------------------------------------------
// RepositoryMetadata
// ---------------------------------------------------------------------------

/// Repository-level facts owned by the metadata fetcher, attached to the
/// context after ingestion. Every field is optional: local repositories and
/// unknown hosts produce an empty record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Default branch name (e.g. "main").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    /// SPDX or display name of the license.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    /// URL of the license text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    /// Project homepage, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    /// Repository owner login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// When the repository was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// RepositoryContext
// ---------------------------------------------------------------------------

/// Immutable snapshot of facts extracted from a repository working copy.
///
/// Built once by the ingestion pipeline and shared read-only with every
/// prompt builder and the model handler; no component mutates it after
/// construction.
///
/// Invariants upheld by the ingestion pipeline:
/// - `files` excludes binary, lock, and dependency-manifest files, and is
///   unique by path (manifests are parsed into `dependencies` instead)
/// - the values of `language_counts` sum to `files.len()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryContext {
    /// Repository name (directory base name or remote repo name).
    pub name: String,
    /// Retained text files in walk order.
    pub files: Vec<FileContext>,
    /// Dependency identifiers deduplicated across all manifests, sorted.
    pub dependencies: Vec<String>,
    /// Relative paths recognized as documentation.
    pub docs_paths: Vec<String>,
    /// Language name → number of retained files classified as that language.
    pub language_counts: BTreeMap<String, usize>,
    /// Repository-level facts from the metadata fetcher.
    #[serde(default)]
    pub metadata: RepositoryMetadata,
}

impl RepositoryContext {
    /// Attach fetched metadata, consuming and returning the context. The
    /// snapshot stays immutable once the pipeline hands it to prompt
    /// builders; attachment happens before that point.
    pub fn with_metadata(mut self, metadata: RepositoryMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Total number of retained files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Whether a documentation path with the given prefix was found.
    pub fn has_docs_path(&self, prefix: &str) -> bool {
        self.docs_paths.iter().any(|p| p.starts_with(prefix))
    }
}
