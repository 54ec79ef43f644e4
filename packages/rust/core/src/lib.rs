//! Pipeline orchestration for readmegen: load → ingest → dispatch → assemble.

pub mod loader;
pub mod metadata;
pub mod pipeline;

pub use loader::{load_repository, repo_name_from_url};
pub use metadata::MetadataFetcher;
pub use pipeline::{
    GenerateConfig, GenerateResult, ProgressReporter, SilentProgress, generate_readme,
};
