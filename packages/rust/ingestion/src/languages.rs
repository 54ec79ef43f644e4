//! Static extension → language classification table.

/// Language bucket for files whose extension is not in the table.
pub const OTHER_LANGUAGE: &str = "other";

/// Map a file extension (without the dot, case-insensitive) to a language
/// name. Returns `None` for unknown extensions; callers count those under
/// [`OTHER_LANGUAGE`].
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_ascii_lowercase().as_str() {
        "py" | "pyi" => "python",
        "rs" => "rust",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascript",
        "ts" | "mts" => "typescript",
        "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hxx" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "scala" => "scala",
        "sh" | "bash" | "zsh" => "shell",
        "pl" | "pm" => "perl",
        "r" => "r",
        "lua" => "lua",
        "ex" | "exs" => "elixir",
        "erl" | "hrl" => "erlang",
        "hs" => "haskell",
        "ml" | "mli" => "ocaml",
        "jl" => "julia",
        "zig" => "zig",
        "dart" => "dart",
        "md" | "markdown" => "markdown",
        "rst" => "restructuredtext",
        "txt" => "text",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" | "sass" => "scss",
        "sql" => "sql",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "xml" => "xml",
        "ini" | "cfg" => "ini",
        "dockerfile" => "docker",
        "tf" => "terraform",
        "proto" => "protobuf",
        _ => return None,
    };
    Some(lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(language_for_extension("py"), Some("python"));
        assert_eq!(language_for_extension("RS"), Some("rust"));
        assert_eq!(language_for_extension("md"), Some("markdown"));
        assert_eq!(language_for_extension("yml"), Some("yaml"));
    }

    #[test]
    fn unknown_extension_is_none() {
        assert_eq!(language_for_extension("xyzzy"), None);
        assert_eq!(language_for_extension(""), None);
    }
}
