//! README assembly from a repository context and generated section text.
//!
//! The builder renders each README section from templates, substituting the
//! cleaned model output the dispatch engine produced. Sections degrade
//! gracefully: a failed generation shows the configured placeholder instead
//! of aborting the build.

mod badges;
mod cleaner;

pub use badges::{language_badge, tech_badges};
pub use cleaner::process_markdown;

use tracing::debug;

use readmegen_shared::{MarkdownConfig, RepositoryContext};

// ---------------------------------------------------------------------------
// GeneratedSections
// ---------------------------------------------------------------------------

/// Cleaned model output for the generated README sections. The pipeline
/// driver fills failed jobs with the configured placeholder before handing
/// the sections over.
#[derive(Debug, Clone, Default)]
pub struct GeneratedSections {
    /// High-level project overview.
    pub overview: String,
    /// Core features table.
    pub core_features: String,
    /// Per-group file summaries, in dispatch order.
    pub file_summaries: Vec<String>,
}

// ---------------------------------------------------------------------------
// MarkdownBuilder
// ---------------------------------------------------------------------------

/// Builds each section of the README markdown file.
pub struct MarkdownBuilder<'a> {
    config: &'a MarkdownConfig,
    context: &'a RepositoryContext,
    sections: &'a GeneratedSections,
}

impl<'a> MarkdownBuilder<'a> {
    pub fn new(
        config: &'a MarkdownConfig,
        context: &'a RepositoryContext,
        sections: &'a GeneratedSections,
    ) -> Self {
        Self {
            config,
            context,
            sections,
        }
    }

    /// Assemble the full README.
    pub fn build(&self) -> String {
        let parts = [
            self.header(),
            self.overview(),
            self.table_of_contents(),
            self.core_features(),
            self.file_summaries(),
            self.getting_started(),
            self.license(),
            self.acknowledgments(),
        ];
        debug!(sections = parts.len(), "assembled README sections");
        let mut readme = parts.join("\n\n");
        readme.push('\n');
        readme
    }

    fn header(&self) -> String {
        let title = self.context.name.to_uppercase();
        let badge_lines = badges::tech_badges(&self.context.dependencies, &self.config.badge_style);
        let language_line = self
            .context
            .language_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(lang, _)| badges::language_badge(lang, &self.config.badge_style))
            .unwrap_or_default();

        let mut header = format!("<h1 align=\"center\">{title}</h1>\n\n<p align=\"center\">");
        header.push('\n');
        if !language_line.is_empty() {
            header.push_str(&language_line);
            header.push('\n');
        }
        if !badge_lines.is_empty() {
            header.push_str(&badge_lines);
            header.push('\n');
        }
        header.push_str("</p>");
        header
    }

    fn overview(&self) -> String {
        format!("## Overview\n\n{}", self.or_placeholder(&self.sections.overview))
    }

    fn table_of_contents(&self) -> String {
        "## Table of Contents\n\n\
         - [Overview](#overview)\n\
         - [Core Features](#core-features)\n\
         - [Module Summaries](#module-summaries)\n\
         - [Getting Started](#getting-started)\n\
         - [License](#license)"
            .to_string()
    }

    fn core_features(&self) -> String {
        format!(
            "## Core Features\n\n{}",
            self.or_placeholder(&self.sections.core_features)
        )
    }

    fn file_summaries(&self) -> String {
        let mut section = String::from("## Module Summaries\n\n<details>\n<summary>Per-file summaries</summary>\n\n");
        if self.sections.file_summaries.is_empty() {
            section.push_str(&self.config.placeholder);
            section.push('\n');
        } else {
            for summary in &self.sections.file_summaries {
                section.push_str(&self.or_placeholder(summary));
                section.push_str("\n\n");
            }
        }
        section.push_str("</details>");
        section
    }

    /// Quickstart hints derived from the languages present in the context.
    fn getting_started(&self) -> String {
        const LANGUAGE_STEPS: &[(&str, &str)] = &[
            ("python", "pip install -r requirements.txt"),
            ("javascript", "npm install"),
            ("typescript", "npm install"),
            ("rust", "cargo build --release"),
            ("go", "go build ./..."),
        ];

        let mut steps: Vec<&str> = LANGUAGE_STEPS
            .iter()
            .filter(|(lang, _)| self.context.language_counts.contains_key(*lang))
            .map(|(_, step)| *step)
            .collect();
        steps.dedup();

        let body = if steps.is_empty() {
            "See the repository documentation for build instructions.".to_string()
        } else {
            format!("```sh\n{}\n```", steps.join("\n"))
        };
        format!("## Getting Started\n\n{body}")
    }

    fn license(&self) -> String {
        let name = self
            .context
            .metadata
            .license_name
            .as_deref()
            .unwrap_or("See repository");

        // Prefer a license file found during ingestion over the hosted URL
        let link = self
            .context
            .docs_paths
            .iter()
            .find(|p| p.starts_with("LICENSE") || p.starts_with("LICENCE"))
            .cloned()
            .or_else(|| self.context.metadata.license_url.clone());

        match link {
            Some(link) => format!("## License\n\n[{name}]({link})"),
            None => format!("## License\n\n{name}"),
        }
    }

    fn acknowledgments(&self) -> String {
        "## Acknowledgments\n\n- Generated with readmegen.".to_string()
    }

    fn or_placeholder(&self, text: &str) -> String {
        if text.trim().is_empty() {
            self.config.placeholder.clone()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmegen_shared::{FileContext, RepositoryMetadata};
    use std::collections::BTreeMap;

    fn sample_context() -> RepositoryContext {
        RepositoryContext {
            name: "demo".into(),
            files: vec![FileContext {
                path: "app.py".into(),
                name: "app.py".into(),
                content: "print('x')".into(),
            }],
            dependencies: vec!["flask".into()],
            docs_paths: vec!["README.md".into(), "LICENSE".into()],
            language_counts: BTreeMap::from([("python".into(), 1)]),
            metadata: RepositoryMetadata {
                license_name: Some("MIT".into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn builds_all_sections() {
        let config = MarkdownConfig::default();
        let sections = GeneratedSections {
            overview: "A demo project.".into(),
            core_features: "| Feature | Description |".into(),
            file_summaries: vec!["- app.py: entry point".into()],
        };
        let readme = MarkdownBuilder::new(&config, &sample_context(), &sections).build();

        assert!(readme.contains("<h1 align=\"center\">DEMO</h1>"));
        assert!(readme.contains("## Overview\n\nA demo project."));
        assert!(readme.contains("| Feature | Description |"));
        assert!(readme.contains("app.py: entry point"));
        assert!(readme.contains("pip install -r requirements.txt"));
        assert!(readme.contains("[MIT](LICENSE)"));
        assert!(readme.contains("Flask"));
    }

    #[test]
    fn empty_sections_render_the_placeholder() {
        let config = MarkdownConfig::default();
        let sections = GeneratedSections::default();
        let readme = MarkdownBuilder::new(&config, &sample_context(), &sections).build();

        assert!(readme.contains(&config.placeholder));
    }

    #[test]
    fn license_falls_back_to_metadata_url() {
        let config = MarkdownConfig::default();
        let mut context = sample_context();
        context.docs_paths = vec!["README.md".into()];
        context.metadata.license_url = Some("https://example.com/license".into());
        let sections = GeneratedSections::default();

        let readme = MarkdownBuilder::new(&config, &context, &sections).build();
        assert!(readme.contains("[MIT](https://example.com/license)"));
    }
}
