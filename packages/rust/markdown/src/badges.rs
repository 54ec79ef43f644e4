//! shields.io badge markdown for recognized technologies.

/// Known technology badges: dependency name → (display label, logo slug,
/// hex color).
const TECH_BADGES: &[(&str, &str, &str, &str)] = &[
    ("flask", "Flask", "flask", "000000"),
    ("django", "Django", "django", "092E20"),
    ("fastapi", "FastAPI", "fastapi", "009688"),
    ("requests", "Requests", "python", "3776AB"),
    ("numpy", "NumPy", "numpy", "013243"),
    ("pandas", "pandas", "pandas", "150458"),
    ("pytest", "Pytest", "pytest", "0A9EDC"),
    ("react", "React", "react", "61DAFB"),
    ("vue", "Vue.js", "vuedotjs", "4FC08D"),
    ("express", "Express", "express", "000000"),
    ("typescript", "TypeScript", "typescript", "3178C6"),
    ("vitest", "Vitest", "vitest", "6E9F18"),
    ("tokio", "Tokio", "rust", "000000"),
    ("serde", "Serde", "rust", "000000"),
    ("reqwest", "Reqwest", "rust", "000000"),
    ("clap", "Clap", "rust", "000000"),
];

/// Render badge markdown for every recognized dependency, one per line
/// chunk, preserving the dependency order. Unrecognized dependencies render
/// no badge.
pub fn tech_badges(dependencies: &[String], style: &str) -> String {
    dependencies
        .iter()
        .filter_map(|dep| {
            let key = dep.to_ascii_lowercase();
            TECH_BADGES
                .iter()
                .find(|(name, _, _, _)| *name == key)
                .map(|(_, label, logo, color)| {
                    format!(
                        "![{label}](https://img.shields.io/badge/{label}-{color}?style={style}&logo={logo}&logoColor=white)"
                    )
                })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Language badge for the most common language in the repository.
pub fn language_badge(language: &str, style: &str) -> String {
    format!(
        "![{language}](https://img.shields.io/badge/lang-{language}-blue?style={style})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_badges_in_order() {
        let deps = vec!["flask".to_string(), "unknown-lib".to_string(), "react".to_string()];
        let badges = tech_badges(&deps, "flat");
        let lines: Vec<&str> = badges.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Flask"));
        assert!(lines[1].contains("React"));
        assert!(badges.contains("style=flat"));
    }

    #[test]
    fn no_known_dependencies_renders_nothing() {
        let deps = vec!["some-internal-lib".to_string()];
        assert!(tech_badges(&deps, "flat").is_empty());
    }
}
