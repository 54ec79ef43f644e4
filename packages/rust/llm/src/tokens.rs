//! Token budget arithmetic and prompt truncation.
//!
//! Token counts are estimated with a chars-per-token approximation rather
//! than a real tokenizer: the target model's tokenizer may be unknown at
//! generation time. [`CHARS_PER_TOKEN`] is a tunable constant, not a
//! correctness-critical value: on code-heavy text the estimate is within
//! roughly ±25% of common BPE tokenizers, and every consumer treats it as a
//! conservative bound, never an exact count.

use tracing::warn;

/// Average characters per token assumed by the estimator.
pub const CHARS_PER_TOKEN: f32 = 4.0;

/// Minimum token allowance reserved for the model's response. A prompt that
/// leaves less than this is truncated rather than the allowance shrunk.
pub const RESPONSE_FLOOR: usize = 256;

/// Marker appended to truncated prompts. Counted inside the budget so a
/// truncated prompt still fits the window.
const TRUNCATION_MARKER: &str = "\n\n[... remaining content omitted to fit the context window ...]";

/// Estimate the token count of `text`.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f32 / CHARS_PER_TOKEN).ceil() as usize
}

/// Portion of a model window available to prompt content, leaving the
/// response floor free.
pub fn prompt_token_budget(context_window: usize) -> usize {
    context_window.saturating_sub(RESPONSE_FLOOR)
}

/// Compute the response token ceiling for a rendered prompt.
///
/// Returns `configured_limit - estimated_prompt_tokens`, never below
/// [`RESPONSE_FLOOR`]: when the prompt estimate already exceeds the limit
/// the floor is returned rather than zero or a negative value.
pub fn update_max_tokens(configured_limit: usize, rendered_prompt: &str) -> usize {
    configured_limit
        .saturating_sub(estimate_tokens(rendered_prompt))
        .max(RESPONSE_FLOOR)
}

/// Fit a prompt into the model's context window before it is sent.
///
/// Prompts within the window pass through unchanged, so the handler is
/// idempotent. Oversized prompts keep their head (instructions lead every
/// prompt template, content listings trail) and are cut tail-first at a
/// character boundary, with a marker appended inside the budget. Truncation
/// is deterministic for identical input and logged with the job index.
pub fn token_handler(context_window: usize, index: usize, prompt: String) -> String {
    let max_chars = (context_window as f32 * CHARS_PER_TOKEN) as usize;
    let char_count = prompt.chars().count();
    if char_count <= max_chars {
        return prompt;
    }

    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut truncated: String = prompt.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);

    warn!(
        index,
        original_chars = char_count,
        retained_chars = keep,
        "prompt truncated to fit context window"
    );

    truncated
}
