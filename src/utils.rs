use std::ffi::OsStr;
use std::path::Path;

/// Returns true when the extension belongs to the recognized source-code
/// allow-list used by the directory loader.
pub fn is_code_file(path: &Path) -> bool {
    !get_language_tag(path).is_empty()
}

pub fn get_language_tag(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(OsStr::to_str)
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "rs" => "rust",
        "js" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "py" => "python",
        "java" => "java",
        "go" => "go",
        "rb" => "ruby",
        "c" => "c",
        "cpp" => "cpp",
        "h" => "c",
        "sh" => "bash",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn recognizes_code_extensions_case_insensitively() {
        assert!(is_code_file(Path::new("main.rs")));
        assert!(is_code_file(Path::new("Main.PY")));
        assert!(is_code_file(Path::new("nested/dir/app.ts")));
    }

    #[test]
    fn rejects_non_code_files() {
        assert!(!is_code_file(Path::new("notes.txt")));
        assert!(!is_code_file(Path::new("README.md")));
        assert!(!is_code_file(Path::new("Makefile")));
    }
}
