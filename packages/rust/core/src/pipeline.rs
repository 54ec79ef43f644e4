//! End-to-end `generate` pipeline: repository → ingest → dispatch → README.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use readmegen_ingestion::RepositoryProcessor;
use readmegen_llm::{BatchDispatcher, JobOutcome, ModelHandler, PromptKind};
use readmegen_markdown::{GeneratedSections, MarkdownBuilder, process_markdown};
use readmegen_shared::{AppConfig, ReadmeGenError, Result};

use crate::loader::load_repository;
use crate::metadata::MetadataFetcher;

/// Options for one `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Local path or remote URL of the repository to document.
    pub repository: String,
    /// Where to write the generated README.
    pub output_file: PathBuf,
}

/// Result of a completed `generate` run.
#[derive(Debug)]
pub struct GenerateResult {
    /// Path of the written README.
    pub output_file: PathBuf,
    /// Number of files retained in the repository context.
    pub files_analyzed: usize,
    /// Total prompt jobs dispatched.
    pub jobs_dispatched: usize,
    /// Jobs that failed and were rendered with the placeholder.
    pub jobs_failed: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &GenerateResult) {}
}

/// Run the full `generate` pipeline.
///
/// 1. Validate the backend configuration (fails fast on an unknown service)
/// 2. Load the repository into a temp working directory
/// 3. Ingest it into a repository context
/// 4. Attach hosting metadata (non-fatal on failure)
/// 5. Dispatch the batched prompt sequence
/// 6. Assemble and write the README
#[instrument(skip_all, fields(repository = %opts.repository))]
pub async fn generate_readme(
    config: &AppConfig,
    opts: &GenerateConfig,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();

    // Backend selection happens before any filesystem or network work so an
    // unsupported service aborts the run immediately.
    progress.phase("Validating backend configuration");
    let handler = ModelHandler::from_config(config)?;

    progress.phase("Loading repository");
    let workdir = tempfile::tempdir()
        .map_err(|e| ReadmeGenError::io(std::env::temp_dir(), e))?;
    let local_path = load_repository(&opts.repository, workdir.path())?;

    progress.phase("Processing repository");
    let processor = RepositoryProcessor::new(config.ingestion.clone());
    let context = processor.process(&local_path)?;

    progress.phase("Fetching repository metadata");
    let metadata = match MetadataFetcher::new()?.fetch(&opts.repository).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, "metadata fetch failed, continuing without it");
            Default::default()
        }
    };
    let context = context.with_metadata(metadata);

    info!(
        files = context.file_count(),
        dependencies = context.dependencies.len(),
        languages = context.language_counts.len(),
        docs = context.docs_paths.len(),
        "repository context ready"
    );

    progress.phase("Generating README sections");
    let dispatcher = BatchDispatcher::new(config.api.rate_limit);
    let results = dispatcher
        .batch_request(Arc::new(handler), config, &context)
        .await;

    let jobs_dispatched = results.len();
    let jobs_failed = results.iter().filter(|r| r.outcome.is_failed()).count();
    if jobs_failed > 0 {
        warn!(
            jobs_failed,
            jobs_dispatched, "some sections fall back to the placeholder"
        );
    }

    let mut sections = GeneratedSections::default();
    for result in &results {
        let text = match &result.outcome {
            JobOutcome::Text(text) => process_markdown(text),
            JobOutcome::Failed(_) => config.markdown.placeholder.clone(),
        };
        match result.kind {
            PromptKind::FileSummary => sections.file_summaries.push(text),
            PromptKind::CoreFeatures => sections.core_features = text,
            PromptKind::Overview => sections.overview = text,
        }
    }

    progress.phase("Assembling README");
    let readme = MarkdownBuilder::new(&config.markdown, &context, &sections).build();

    if let Some(parent) = opts.output_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ReadmeGenError::io(parent, e))?;
        }
    }
    std::fs::write(&opts.output_file, readme)
        .map_err(|e| ReadmeGenError::io(&opts.output_file, e))?;

    let result = GenerateResult {
        output_file: opts.output_file.clone(),
        files_analyzed: context.file_count(),
        jobs_dispatched,
        jobs_failed,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        output = %result.output_file.display(),
        files = result.files_analyzed,
        jobs = result.jobs_dispatched,
        failed = result.jobs_failed,
        elapsed_ms = result.elapsed.as_millis(),
        "generate pipeline complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scratch_dir(label: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("rg-pipeline-{label}-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write file");
    }

    fn self_hosted_config(endpoint: String) -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.api = "llama".into();
        config.llm.url = endpoint;
        config.api.rate_limit = 2;
        config
    }

    #[tokio::test]
    async fn generates_a_readme_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "content": "generated section text" })),
            )
            .mount(&server)
            .await;

        let repo = scratch_dir("repo");
        write(&repo, "app.py", "print('hello')\n");
        write(&repo, "requirements.txt", "flask==2.0\n");
        write(&repo, "README.md", "# old readme\n");

        let out_dir = scratch_dir("out");
        let opts = GenerateConfig {
            repository: repo.to_string_lossy().into_owned(),
            output_file: out_dir.join("README_GENERATED.md"),
        };
        let config = self_hosted_config(format!("{}/generate", server.uri()));

        let result = generate_readme(&config, &opts, &SilentProgress)
            .await
            .expect("generate");

        assert_eq!(result.jobs_failed, 0);
        // One summary group plus the two synthesis jobs
        assert_eq!(result.jobs_dispatched, 3);

        let readme = fs::read_to_string(&result.output_file).expect("read output");
        assert!(readme.contains("generated section text"));
        assert!(readme.contains("## Overview"));
        assert!(readme.contains("pip install"));

        let _ = fs::remove_dir_all(&repo);
        let _ = fs::remove_dir_all(&out_dir);
    }

    #[tokio::test]
    async fn backend_outage_renders_placeholders_instead_of_failing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let repo = scratch_dir("outage");
        write(&repo, "app.py", "print('hello')\n");

        let out_dir = scratch_dir("outage-out");
        let opts = GenerateConfig {
            repository: repo.to_string_lossy().into_owned(),
            output_file: out_dir.join("README_GENERATED.md"),
        };
        let config = self_hosted_config(format!("{}/generate", server.uri()));

        let result = generate_readme(&config, &opts, &SilentProgress)
            .await
            .expect("generate");

        assert_eq!(result.jobs_failed, result.jobs_dispatched);
        let readme = fs::read_to_string(&result.output_file).expect("read output");
        assert!(readme.contains(&config.markdown.placeholder));

        let _ = fs::remove_dir_all(&repo);
        let _ = fs::remove_dir_all(&out_dir);
    }

    #[tokio::test]
    async fn unsupported_service_aborts_before_loading() {
        let mut config = AppConfig::default();
        config.llm.api = "not-a-service".into();

        let opts = GenerateConfig {
            repository: "/nonexistent/path".into(),
            output_file: PathBuf::from("README_GENERATED.md"),
        };

        let err = generate_readme(&config, &opts, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, ReadmeGenError::UnsupportedService { .. }));
    }
}
