//! Cleanup passes for model-generated markdown.
//!
//! Each pass is a function `&str -> String` applied in sequence. Backends
//! habitually wrap answers in code fences or quotes and pad them with blank
//! lines; the pipeline strips that framing before the text is substituted
//! into a README section.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw model output.
pub fn process_markdown(raw: &str) -> String {
    let mut result = raw.to_string();

    result = strip_code_fence_wrapper(&result);
    result = strip_wrapping_quotes(&result);
    result = collapse_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: unwrap a whole-answer code fence
// ---------------------------------------------------------------------------

/// Remove a code fence that wraps the entire answer (```...``` or
/// ```markdown ... ```). Fences inside the body are left alone.
fn strip_code_fence_wrapper(text: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A\s*```[a-zA-Z]*\n(.*?)\n?```\s*\z").expect("valid regex")
    });

    match FENCE_RE.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Pass 2: strip quotes around the whole answer
// ---------------------------------------------------------------------------

fn strip_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('`', '`')] {
        if trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            return trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()].to_string();
        }
    }
    trimmed.to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: collapse runs of blank lines
// ---------------------------------------------------------------------------

fn collapse_blank_lines(text: &str) -> String {
    static BLANKS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
    BLANKS_RE.replace_all(text, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_fenced_answers() {
        let raw = "```markdown\n# Title\n\nBody text.\n```";
        assert_eq!(process_markdown(raw), "# Title\n\nBody text.");
    }

    #[test]
    fn keeps_inner_fences() {
        let raw = "Intro.\n\n```rust\nfn main() {}\n```\n\nOutro.";
        let cleaned = process_markdown(raw);
        assert!(cleaned.contains("```rust"));
        assert!(cleaned.starts_with("Intro."));
    }

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(process_markdown("\"quoted answer\""), "quoted answer");
    }

    #[test]
    fn collapses_blank_runs() {
        let raw = "a\n\n\n\n\nb";
        assert_eq!(process_markdown(raw), "a\n\nb");
    }

    #[test]
    fn clean_input_passes_through() {
        let raw = "Already clean markdown.";
        assert_eq!(process_markdown(raw), raw);
    }
}
