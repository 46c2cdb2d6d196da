use crate::loader::CodeMap;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mapping from file path to a natural-language description of its content.
pub type DescriptionMap = BTreeMap<PathBuf, String>;

/// Joins per-file descriptions with blank-line separators.
pub fn merge_code_descriptions(descriptions: &DescriptionMap) -> String {
    descriptions
        .values()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Joins raw per-file code blocks with blank-line separators.
///
/// File content is not escaped: code that itself contains a fence delimiter
/// may render incorrectly downstream. That is a documented property of the
/// format, not something this function papers over.
pub fn merge_code(code: &CodeMap) -> String {
    code.iter()
        .map(|(path, content)| format!("File: {}\n```\n{}\n```", path.display(), content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wraps merged content with a caller-supplied prefix and suffix.
pub fn create_prompt(main_content: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}\n{main_content}\n{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptions(pairs: &[(&str, &str)]) -> DescriptionMap {
        pairs
            .iter()
            .map(|(path, text)| (PathBuf::from(path), text.to_string()))
            .collect()
    }

    #[test]
    fn merge_descriptions_separator_count_round_trips() {
        let d = descriptions(&[("a.py", "does a"), ("b.py", "does b"), ("c.py", "does c")]);
        let merged = merge_code_descriptions(&d);
        assert_eq!(merged.split("\n\n").count(), d.len());
    }

    #[test]
    fn merge_descriptions_of_empty_map_is_empty() {
        let merged = merge_code_descriptions(&DescriptionMap::new());
        assert_eq!(merged, "");
    }

    #[test]
    fn merge_code_labels_each_file() {
        let mut code = CodeMap::new();
        code.insert(PathBuf::from("a.py"), "print(1)".to_string());
        let merged = merge_code(&code);
        assert_eq!(merged, "File: a.py\n```\nprint(1)\n```");
    }

    #[test]
    fn create_prompt_wraps_with_prefix_and_suffix() {
        let prompt = create_prompt("body", "PRE", "POST");
        assert_eq!(prompt, "PRE\nbody\nPOST");
    }

    #[test]
    fn embedded_fences_are_passed_through_unescaped() {
        let mut code = CodeMap::new();
        code.insert(
            PathBuf::from("doc.py"),
            "text = \"\"\"\n```\ninner fence\n```\n\"\"\"".to_string(),
        );
        let merged = merge_code(&code);
        // The inner fence survives verbatim, so the merged document contains
        // more fence delimiters than the wrapper contributed.
        assert_eq!(merged.matches("```").count(), 4);
    }
}
