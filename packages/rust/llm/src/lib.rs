//! LLM backend handlers, token budgeting, and batched prompt dispatch.
//!
//! The flow: prompt builders derive typed jobs from a
//! [`RepositoryContext`](readmegen_shared::RepositoryContext), the
//! [`BatchDispatcher`] drives a [`PromptBackend`] over them in rate-limited
//! chunks, and ordered [`BatchResult`]s flow back for README assembly.

pub mod dispatch;
pub mod handler;
pub mod prompts;
pub mod tokens;

pub use dispatch::{BatchDispatcher, BatchResult, DEFAULT_BATCH_SIZE, JobOutcome};
pub use handler::{LlmService, ModelHandler, PromptBackend};
pub use prompts::{PromptJob, PromptKind, build_additional_jobs, build_summary_jobs};
pub use tokens::{
    CHARS_PER_TOKEN, RESPONSE_FLOOR, estimate_tokens, prompt_token_budget, token_handler,
    update_max_tokens,
};
