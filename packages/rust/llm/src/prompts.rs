//! Prompt job construction from a repository context.
//!
//! Two builder phases: file-summary jobs come straight from the context,
//! while the additional jobs (core features, overview) are built from the
//! completed summary results. The second phase takes phase-one output as an
//! explicit argument, never as shared state read mid-flight.

use readmegen_shared::{AppConfig, RepositoryContext};

use crate::dispatch::{BatchResult, JobOutcome};
use crate::tokens::{estimate_tokens, prompt_token_budget, update_max_tokens};

// ---------------------------------------------------------------------------
// PromptKind / PromptJob
// ---------------------------------------------------------------------------

/// The section of the README a prompt job produces text for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Summaries for one group of source files.
    FileSummary,
    /// Synthesis of the project's core features from the summaries.
    CoreFeatures,
    /// High-level project overview.
    Overview,
}

impl PromptKind {
    /// Stable identifier used in logs and result attribution.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileSummary => "file_summary",
            Self::CoreFeatures => "core_features",
            Self::Overview => "overview",
        }
    }
}

/// One unit of dispatch work targeting the model backend.
///
/// Created by the builders below, consumed exactly once by the dispatch
/// engine, discarded after.
#[derive(Debug, Clone)]
pub struct PromptJob {
    /// Which README section this job feeds.
    pub kind: PromptKind,
    /// Fully rendered prompt text.
    pub prompt: String,
    /// Response token ceiling derived from the model window.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
}

// ---------------------------------------------------------------------------
// Phase 1: file-summary jobs
// ---------------------------------------------------------------------------

/// Build one file-summary job per group of files, grouping greedily so each
/// rendered prompt stays under the per-job token budget. A single file too
/// large for the budget still gets its own job; the token handler truncates
/// it at request time.
pub fn build_summary_jobs(config: &AppConfig, context: &RepositoryContext) -> Vec<PromptJob> {
    let budget = prompt_token_budget(config.llm.tokens);
    let template_overhead = estimate_tokens(&render_file_summary_prompt(""));

    let mut jobs = Vec::new();
    let mut group = String::new();
    let mut group_tokens = template_overhead;

    for file in &context.files {
        let entry = format!("### {}\n```\n{}\n```\n\n", file.path, file.content);
        let entry_tokens = estimate_tokens(&entry);

        if !group.is_empty() && group_tokens + entry_tokens > budget {
            jobs.push(summary_job(config, &group));
            group.clear();
            group_tokens = template_overhead;
        }

        group.push_str(&entry);
        group_tokens += entry_tokens;
    }

    if !group.is_empty() {
        jobs.push(summary_job(config, &group));
    }

    jobs
}

fn summary_job(config: &AppConfig, file_listing: &str) -> PromptJob {
    let prompt = render_file_summary_prompt(file_listing);
    let max_tokens = update_max_tokens(config.llm.tokens, &prompt);
    PromptJob {
        kind: PromptKind::FileSummary,
        prompt,
        max_tokens,
        temperature: config.llm.temperature,
    }
}

fn render_file_summary_prompt(file_listing: &str) -> String {
    format!(
        "Summarize each of the following source files in one or two \
         sentences. Focus on the file's role in the project, not its \
         line-by-line behavior. Answer as a markdown list of \
         `path: summary` items.\n\n{file_listing}"
    )
}

// ---------------------------------------------------------------------------
// Phase 2: additional jobs built from completed summaries
// ---------------------------------------------------------------------------

/// Build the core-features and overview jobs from the completed summary
/// results. Failed summary jobs are left out of the digest; the remaining
/// text still gives the synthesis prompts usable grounding.
pub fn build_additional_jobs(
    config: &AppConfig,
    context: &RepositoryContext,
    summaries: &[BatchResult],
) -> Vec<PromptJob> {
    let digest: String = summaries
        .iter()
        .filter_map(|r| match &r.outcome {
            JobOutcome::Text(text) => Some(text.as_str()),
            JobOutcome::Failed(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let languages: Vec<String> = context
        .language_counts
        .iter()
        .map(|(lang, count)| format!("{lang} ({count})"))
        .collect();

    let core_features_prompt = format!(
        "Derive the core features of the project `{name}` from the file \
         summaries below. Answer as a markdown table with columns Feature \
         and Description, at most eight rows.\n\n\
         Dependencies: {deps}\n\nFile summaries:\n{digest}",
        name = context.name,
        deps = context.dependencies.join(", "),
    );

    let overview_prompt = format!(
        "Write a three-sentence overview of the project `{name}` for the \
         top of its README. Languages: {languages}. {files} files \
         analyzed.\n\nFile summaries:\n{digest}",
        name = context.name,
        languages = languages.join(", "),
        files = context.file_count(),
    );

    [
        (PromptKind::CoreFeatures, core_features_prompt),
        (PromptKind::Overview, overview_prompt),
    ]
    .into_iter()
    .map(|(kind, prompt)| {
        let max_tokens = update_max_tokens(config.llm.tokens, &prompt);
        PromptJob {
            kind,
            prompt,
            max_tokens,
            temperature: config.llm.temperature,
        }
    })
    .collect()
}
