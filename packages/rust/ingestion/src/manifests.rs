//! Dependency manifest detection and per-format parsing.
//!
//! Each supported manifest format yields a flat list of dependency names.
//! Parsing one malformed manifest must never abort ingestion of the rest:
//! the processor records a diagnostic and moves on.

use std::sync::LazyLock;

use regex::Regex;

use readmegen_shared::{ReadmeGenError, Result};

/// Supported dependency manifest formats, detected by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// pip `requirements.txt` (one requirement spec per line).
    Requirements,
    /// npm `package.json`.
    PackageJson,
    /// Cargo `Cargo.toml`.
    CargoToml,
    /// PEP 621 / poetry `pyproject.toml`.
    PyprojectToml,
    /// Go modules `go.mod`.
    GoMod,
}

impl ManifestFormat {
    /// Detect the manifest format from a file base name.
    pub fn detect(name: &str) -> Option<Self> {
        match name {
            "requirements.txt" => Some(Self::Requirements),
            "package.json" => Some(Self::PackageJson),
            "Cargo.toml" => Some(Self::CargoToml),
            "pyproject.toml" => Some(Self::PyprojectToml),
            "go.mod" => Some(Self::GoMod),
            _ => None,
        }
    }
}

/// Lock files are excluded from the retained file set and never parsed for
/// dependencies: their contents are machine-generated expansions of the
/// declared manifests.
pub fn is_lock_file(name: &str) -> bool {
    name.ends_with(".lock")
        || matches!(
            name,
            "package-lock.json" | "yarn.lock" | "pnpm-lock.yaml" | "Pipfile.lock"
        )
}

/// First requirement token on a requirements.txt line: the package name up to
/// any extras marker, comparator, or environment marker.
static REQUIREMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*").expect("valid regex"));

/// Parse a manifest's content into declared dependency names.
///
/// Names are returned in file order, unsanitized apart from trimming;
/// deduplication across manifests happens in the processor.
pub fn parse_manifest(format: ManifestFormat, content: &str) -> Result<Vec<String>> {
    match format {
        ManifestFormat::Requirements => Ok(parse_requirements(content)),
        ManifestFormat::PackageJson => parse_package_json(content),
        ManifestFormat::CargoToml => parse_cargo_toml(content),
        ManifestFormat::PyprojectToml => parse_pyproject_toml(content),
        ManifestFormat::GoMod => Ok(parse_go_mod(content)),
    }
}

fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| REQUIREMENT_NAME.find(line))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn parse_package_json(content: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ReadmeGenError::validation(format!("package.json: {e}")))?;

    let mut deps = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = value.get(section).and_then(|v| v.as_object()) {
            deps.extend(map.keys().cloned());
        }
    }
    Ok(deps)
}

fn parse_cargo_toml(content: &str) -> Result<Vec<String>> {
    let value: toml::Value = toml::from_str(content)
        .map_err(|e| ReadmeGenError::validation(format!("Cargo.toml: {e}")))?;

    let mut deps = Vec::new();
    for section in ["dependencies", "dev-dependencies", "build-dependencies"] {
        if let Some(table) = value.get(section).and_then(|v| v.as_table()) {
            deps.extend(table.keys().cloned());
        }
    }
    // Workspace manifests declare the shared table under [workspace.dependencies]
    if let Some(table) = value
        .get("workspace")
        .and_then(|w| w.get("dependencies"))
        .and_then(|v| v.as_table())
    {
        deps.extend(table.keys().cloned());
    }
    Ok(deps)
}

fn parse_pyproject_toml(content: &str) -> Result<Vec<String>> {
    let value: toml::Value = toml::from_str(content)
        .map_err(|e| ReadmeGenError::validation(format!("pyproject.toml: {e}")))?;

    let mut deps = Vec::new();

    // PEP 621: [project] dependencies = ["flask>=2.0", ...]
    if let Some(list) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|v| v.as_array())
    {
        deps.extend(
            list.iter()
                .filter_map(|v| v.as_str())
                .filter_map(|spec| REQUIREMENT_NAME.find(spec.trim()))
                .map(|m| m.as_str().to_string()),
        );
    }

    // Poetry: [tool.poetry.dependencies] name = "^1.0"
    if let Some(table) = value
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|v| v.as_table())
    {
        deps.extend(table.keys().filter(|k| *k != "python").cloned());
    }

    Ok(deps)
}

fn parse_go_mod(content: &str) -> Vec<String> {
    let mut deps = Vec::new();
    let mut in_require_block = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            if let Some(module) = line.split_whitespace().next() {
                deps.push(module.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(module) = rest.split_whitespace().next() {
                deps.push(module.to_string());
            }
        }
    }
    deps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_manifest_formats() {
        assert_eq!(
            ManifestFormat::detect("requirements.txt"),
            Some(ManifestFormat::Requirements)
        );
        assert_eq!(
            ManifestFormat::detect("package.json"),
            Some(ManifestFormat::PackageJson)
        );
        assert_eq!(ManifestFormat::detect("main.py"), None);
    }

    #[test]
    fn lock_files_are_recognized() {
        assert!(is_lock_file("Cargo.lock"));
        assert!(is_lock_file("poetry.lock"));
        assert!(is_lock_file("package-lock.json"));
        assert!(!is_lock_file("package.json"));
    }

    #[test]
    fn parses_requirements() {
        let content = "\
# web stack
flask==2.0
requests>=2.28,<3
uvicorn[standard]~=0.23
-r extra.txt

pydantic";
        let deps = parse_manifest(ManifestFormat::Requirements, content).expect("parse");
        assert_eq!(deps, vec!["flask", "requests", "uvicorn", "pydantic"]);
    }

    #[test]
    fn parses_package_json() {
        let content = r#"{
  "name": "demo",
  "dependencies": { "react": "^18.0.0" },
  "devDependencies": { "vitest": "^1.0.0" }
}"#;
        let deps = parse_manifest(ManifestFormat::PackageJson, content).expect("parse");
        assert!(deps.contains(&"react".to_string()));
        assert!(deps.contains(&"vitest".to_string()));
    }

    #[test]
    fn parses_cargo_toml() {
        let content = r#"
[package]
name = "demo"

[dependencies]
serde = "1"
tokio = { version = "1", features = ["full"] }

[dev-dependencies]
wiremock = "0.6"
"#;
        let deps = parse_manifest(ManifestFormat::CargoToml, content).expect("parse");
        assert!(deps.contains(&"serde".to_string()));
        assert!(deps.contains(&"tokio".to_string()));
        assert!(deps.contains(&"wiremock".to_string()));
    }

    #[test]
    fn parses_pyproject_both_styles() {
        let content = r#"
[project]
dependencies = ["flask>=2.0", "httpx"]

[tool.poetry.dependencies]
python = "^3.11"
rich = "^13.0"
"#;
        let deps = parse_manifest(ManifestFormat::PyprojectToml, content).expect("parse");
        assert_eq!(deps, vec!["flask", "httpx", "rich"]);
    }

    #[test]
    fn parses_go_mod() {
        let content = "\
module example.com/demo

go 1.22

require (
\tgithub.com/spf13/cobra v1.8.0
\tgolang.org/x/sync v0.6.0
)

require github.com/pkg/errors v0.9.1
";
        let deps = parse_manifest(ManifestFormat::GoMod, content).expect("parse");
        assert_eq!(
            deps,
            vec![
                "github.com/spf13/cobra",
                "golang.org/x/sync",
                "github.com/pkg/errors"
            ]
        );
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = parse_manifest(ManifestFormat::PackageJson, "{ not json").unwrap_err();
        assert!(err.to_string().contains("package.json"));
    }
}
