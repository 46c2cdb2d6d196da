use crate::utils::is_code_file;
use anyhow::{Context, Result};
use content_inspector::{inspect, ContentType};
use ignore::{DirEntry, WalkBuilder};
use log::{debug, warn};
use memmap2::MmapOptions;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Mapping from file path to raw text content.
pub type CodeMap = BTreeMap<PathBuf, String>;

/// Loads code from `path`.
///
/// A single file becomes a one-entry mapping regardless of its extension; a
/// directory is walked recursively and only files on the recognized code
/// extension allow-list are kept. A missing or unreadable path is a fatal
/// error and propagates to the caller.
pub fn load_code(path: &Path) -> Result<CodeMap> {
    if path.is_dir() {
        load_directory(path)
    } else {
        let content = read_text(path)?
            .with_context(|| format!("binary content in {}", path.display()))?;
        let mut map = CodeMap::new();
        map.insert(path.to_path_buf(), content);
        Ok(map)
    }
}

fn load_directory(root: &Path) -> Result<CodeMap> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(true).ignore(false);
    builder.filter_entry(|e| !is_hidden(e));

    let mut map = CodeMap::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!("error walking path: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_code_file(path) {
            continue;
        }
        debug!("loading {}", path.display());
        match read_text(path)? {
            Some(content) => {
                map.insert(path.to_path_buf(), content);
            }
            None => warn!("skipping binary file {}", path.display()),
        }
    }
    Ok(map)
}

/// Reads a file as text via mmap, returning `None` for binary content.
fn read_text(path: &Path) -> Result<Option<String>> {
    let file =
        File::open(path).with_context(|| format!("failed to open file: {}", path.display()))?;

    let mmap = unsafe {
        MmapOptions::new()
            .map(&file)
            .with_context(|| format!("failed to mmap file: {}", path.display()))?
    };

    let sample_size = std::cmp::min(8192, mmap.len());
    if inspect(&mmap[..sample_size]) == ContentType::BINARY {
        return Ok(None);
    }

    match std::str::from_utf8(&mmap) {
        Ok(text) => Ok(Some(text.to_owned())),
        Err(_) => {
            // mmap'd bytes were not valid UTF-8, retry through the lossless path
            debug!("invalid UTF-8 in {}, falling back to read_to_string", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("fallback read failed for {}", path.display()))?;
            Ok(Some(content))
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .path()
        .file_name()
        .and_then(|s| s.to_str())
        .map_or(false, |s| s.starts_with('.'))
}
