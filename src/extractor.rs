use anyhow::Result;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// One named code block lifted out of a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub filename: String,
    pub code: String,
}

/// Matches a heading line naming a file, immediately followed by a fenced
/// block. The heading allows optional emphasis markers and an optional
/// "<digits>. " ordinal around the back-tick-quoted filename, e.g.
/// `**1. `src/main.rs`**`. Multiline with dot-matches-newline so the lazy
/// body group can span lines.
static SNIPPET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ms)^\s*\**\s*(?:\d+\.\s*)?`(?P<filename>[^`]+)`\s*\**\s*\n```(?P<language>\w*)\n(?P<code>.*?)\n```",
    )
    .expect("snippet pattern is valid")
});

/// Parses a markdown document into (filename, code) pairs.
///
/// Parsing is lenient by design: any candidate block that does not match the
/// expected heading + fence shape is skipped silently rather than reported.
/// The code body is trimmed of leading and trailing whitespace.
pub fn parse_markdown(markdown: &str) -> Vec<CodeSnippet> {
    SNIPPET_RE
        .captures_iter(markdown)
        .map(|caps| CodeSnippet {
            filename: caps["filename"].to_string(),
            code: caps["code"].trim().to_string(),
        })
        .collect()
}

/// Outcome of one extraction batch. Partial success is expected: a failed
/// write is recorded here instead of aborting the remaining snippets.
#[derive(Debug, Default)]
pub struct ExtractReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl ExtractReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes one snippet under `output_dir`, creating any parent directories the
/// filename implies. An existing file at the target path is overwritten.
pub fn write_snippet(snippet: &CodeSnippet, output_dir: &Path) -> std::io::Result<PathBuf> {
    let target = output_dir.join(&snippet.filename);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, &snippet.code)?;
    Ok(target)
}

/// Extracts every recognizable code block from `markdown` and materializes
/// it under `output_dir`. Write failures are logged per file and collected
/// in the report; they never abort the batch.
pub fn extract_and_write_code(markdown: &str, output_dir: &Path) -> Result<ExtractReport> {
    let snippets = parse_markdown(markdown);
    let mut report = ExtractReport::default();

    for snippet in &snippets {
        match write_snippet(snippet, output_dir) {
            Ok(target) => {
                info!("wrote {}", target.display());
                report.written.push(target);
            }
            Err(err) => {
                let target = output_dir.join(&snippet.filename);
                warn!("error writing {}: {err}", target.display());
                report.failed.push((target, err.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_plain_heading_and_fence() {
        let md = "`a.py`\n```python\nprint(1)\n```\n";
        let snippets = parse_markdown(md);
        assert_eq!(
            snippets,
            vec![CodeSnippet {
                filename: "a.py".into(),
                code: "print(1)".into()
            }]
        );
    }

    #[test]
    fn parses_emphasis_and_ordinal_headings() {
        let md = "**1. `src/main.rs`**\n```rust\nfn main() {}\n```\n";
        let snippets = parse_markdown(md);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].filename, "src/main.rs");
        assert_eq!(snippets[0].code, "fn main() {}");
    }

    #[test]
    fn untagged_fence_and_multiline_body() {
        let md = "`a.py`\n```\nline1\n\nline3\n```\n";
        let snippets = parse_markdown(md);
        assert_eq!(snippets[0].code, "line1\n\nline3");
    }

    #[test]
    fn body_whitespace_is_trimmed() {
        let md = "`a.py`\n```\n   print(1)   \n```\n";
        let snippets = parse_markdown(md);
        assert_eq!(snippets[0].code, "print(1)");
    }

    #[test]
    fn heading_without_backticks_is_skipped_silently() {
        let md = "\
a.py
```python
print(1)
```

`b.py`
```python
print(2)
```
";
        let snippets = parse_markdown(md);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].filename, "b.py");
    }

    #[test]
    fn fence_without_heading_is_skipped_silently() {
        let md = "some prose\n```python\nprint(1)\n```\n";
        assert!(parse_markdown(md).is_empty());
    }

    #[test]
    fn empty_document_yields_no_snippets() {
        assert!(parse_markdown("").is_empty());
    }

    #[test]
    fn writes_snippet_into_nested_directories() -> Result<()> {
        let dir = tempdir()?;
        let snippet = CodeSnippet {
            filename: "utils/b.py".into(),
            code: "print(2)".into(),
        };
        let target = write_snippet(&snippet, dir.path())?;
        assert_eq!(target, dir.path().join("utils/b.py"));
        assert_eq!(std::fs::read_to_string(target)?, "print(2)");
        Ok(())
    }

    #[test]
    fn overwrites_existing_file() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.py"), "old")?;
        let snippet = CodeSnippet {
            filename: "a.py".into(),
            code: "new".into(),
        };
        write_snippet(&snippet, dir.path())?;
        assert_eq!(std::fs::read_to_string(dir.path().join("a.py"))?, "new");
        Ok(())
    }

    #[test]
    fn failed_write_does_not_abort_the_batch() -> Result<()> {
        let dir = tempdir()?;
        // A directory already sits where the first snippet wants a file.
        std::fs::create_dir_all(dir.path().join("a.py"))?;
        let md = "`a.py`\n```\nprint(1)\n```\n\n`b.py`\n```\nprint(2)\n```\n";

        let report = extract_and_write_code(md, dir.path())?;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.written, vec![dir.path().join("b.py")]);
        assert!(!report.is_complete());
        assert_eq!(std::fs::read_to_string(dir.path().join("b.py"))?, "print(2)");
        Ok(())
    }
}
