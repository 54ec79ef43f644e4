//! Repository ingestion pipeline: working copy → [`RepositoryContext`].
//!
//! Walks the repository tree, classifies file languages, extracts declared
//! dependencies from manifests, and recognizes documentation paths. Lock and
//! dependency-manifest files feed the dependency set but are not retained in
//! the file list, so language counts always sum to the retained file count.
//! The resulting context is immutable and shared read-only with the prompt
//! builders and model handler.

mod docs;
mod languages;
mod manifests;

pub use docs::is_docs_path;
pub use languages::{OTHER_LANGUAGE, language_for_extension};
pub use manifests::{ManifestFormat, is_lock_file, parse_manifest};

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use tracing::{debug, info, instrument, warn};

use readmegen_shared::{
    FileContext, IngestionConfig, ReadmeGenError, RepositoryContext, RepositoryMetadata, Result,
};

// ---------------------------------------------------------------------------
// RepositoryProcessor
// ---------------------------------------------------------------------------

/// Walks a repository working copy and extracts a [`RepositoryContext`].
pub struct RepositoryProcessor {
    config: IngestionConfig,
}

impl RepositoryProcessor {
    /// Create a processor with the given ingestion policies.
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    /// Process the repository rooted at `repo_root`.
    ///
    /// Fails with [`ReadmeGenError::Repository`] if the root does not exist
    /// or contains zero readable text files. A malformed dependency manifest
    /// is skipped with a recorded diagnostic and never aborts the walk.
    #[instrument(skip_all, fields(root = %repo_root.display()))]
    pub fn process(&self, repo_root: &Path) -> Result<RepositoryContext> {
        if !repo_root.is_dir() {
            return Err(ReadmeGenError::repository(format!(
                "repository path does not exist: {}",
                repo_root.display()
            )));
        }

        let name = repo_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string());

        let walker = self.build_walker(repo_root)?;

        let mut files: Vec<FileContext> = Vec::new();
        let mut dependencies: BTreeSet<String> = BTreeSet::new();
        let mut docs_paths: Vec<String> = Vec::new();
        let mut language_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut diagnostics: Vec<String> = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let rel_path = path
                .strip_prefix(repo_root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if manifests::is_lock_file(&file_name) {
                debug!(path = %rel_path, "skipping lock file");
                continue;
            }

            if let Ok(meta) = entry.metadata() {
                if meta.len() > self.config.max_file_bytes {
                    debug!(path = %rel_path, size = meta.len(), "skipping oversized file");
                    continue;
                }
            }

            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(e) => {
                    debug!(path = %rel_path, error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let Ok(content) = String::from_utf8(bytes) else {
                debug!(path = %rel_path, "skipping binary file");
                continue;
            };

            // Manifests feed the dependency set but are not retained as
            // context files.
            if let Some(format) = manifests::ManifestFormat::detect(&file_name) {
                match manifests::parse_manifest(format, &content) {
                    Ok(deps) => dependencies.extend(deps),
                    Err(e) => {
                        warn!(path = %rel_path, error = %e, "malformed dependency manifest skipped");
                        diagnostics.push(format!("{rel_path}: {e}"));
                    }
                }
                continue;
            }

            if docs::is_docs_path(&rel_path) {
                docs_paths.push(rel_path.clone());
            }

            let language = Path::new(&file_name)
                .extension()
                .and_then(|ext| languages::language_for_extension(&ext.to_string_lossy()))
                .unwrap_or(languages::OTHER_LANGUAGE);
            *language_counts.entry(language.to_string()).or_insert(0) += 1;

            files.push(FileContext {
                path: rel_path,
                name: file_name,
                content,
            });
        }

        if files.is_empty() {
            return Err(ReadmeGenError::repository(format!(
                "no readable files found under {}",
                repo_root.display()
            )));
        }

        info!(
            name = %name,
            files = files.len(),
            dependencies = dependencies.len(),
            docs = docs_paths.len(),
            manifest_errors = diagnostics.len(),
            "repository processed"
        );

        Ok(RepositoryContext {
            name,
            files,
            dependencies: dependencies.into_iter().collect(),
            docs_paths,
            language_counts,
            metadata: RepositoryMetadata::default(),
        })
    }

    /// Build the tree walker: hidden entries skipped, configured ignore
    /// globs applied, deterministic path order.
    fn build_walker(&self, repo_root: &Path) -> Result<ignore::Walk> {
        let mut overrides = OverrideBuilder::new(repo_root);
        for pattern in &self.config.ignore_patterns {
            // A leading "!" turns an override glob into an exclusion.
            overrides
                .add(&format!("!{pattern}"))
                .map_err(|e| ReadmeGenError::config(format!("bad ignore pattern '{pattern}': {e}")))?;
        }
        let overrides = overrides
            .build()
            .map_err(|e| ReadmeGenError::config(format!("ignore patterns: {e}")))?;

        Ok(WalkBuilder::new(repo_root)
            .overrides(overrides)
            .require_git(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build())
    }
}

impl Default for RepositoryProcessor {
    fn default() -> Self {
        Self::new(IngestionConfig::default())
    }
}
