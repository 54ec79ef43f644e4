//! Documentation path recognition.

/// Directory prefixes whose contents count as documentation.
const DOC_DIR_PREFIXES: &[&str] = &["docs/", "doc/", "examples/", "tutorials/", "guides/"];

/// Root file-name prefixes recognized as documentation.
const DOC_FILE_PREFIXES: &[&str] = &[
    "README",
    "LICENSE",
    "LICENCE",
    "CONTRIBUTING",
    "CITATION",
    "CHANGELOG",
    "CODE_OF_CONDUCT",
];

/// Whether a repository-relative path is a documentation path.
///
/// Matching is by file-name prefix at the repository root (README, LICENSE,
/// CONTRIBUTING, ...) and by directory prefix anywhere below a recognized
/// documentation directory.
pub fn is_docs_path(rel_path: &str) -> bool {
    if DOC_DIR_PREFIXES.iter().any(|p| rel_path.starts_with(p)) {
        return true;
    }
    // Root-level files only: a prefix match inside a subdirectory (say
    // src/README.md) documents that module, not the repository.
    if rel_path.contains('/') {
        return false;
    }
    let upper = rel_path.to_ascii_uppercase();
    DOC_FILE_PREFIXES.iter().any(|p| upper.starts_with(p))
}
