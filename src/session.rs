use anyhow::{Context, Result};
use chrono::Local;
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Consumes incremental text fragments from a streaming response.
///
/// Implementations must make `finish` idempotent; the producer calls it when
/// the stream ends, and `Drop` implementations may call it again.
pub trait FragmentSink {
    fn write_fragment(&mut self, fragment: &str) -> io::Result<()>;
    fn finish(&mut self) -> io::Result<()>;
}

/// Builds a timestamped session file path, `<dir>/temp-<YYYYMMDDHHMMSS>.md`.
pub fn session_path(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    dir.join(format!("temp-{timestamp}.md"))
}

/// Sink that echoes each fragment to stdout and appends it to a session
/// file. The file is flushed when the stream finishes, and again on drop so
/// an interrupted stream still leaves the received text on disk.
pub struct SessionSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SessionSink {
    /// Creates the session directory if needed and opens the session file.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create session directory {}", dir.display()))?;
        let path = session_path(dir);
        let file = File::create(&path)
            .with_context(|| format!("failed to create session file {}", path.display()))?;
        debug!("session file: {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FragmentSink for SessionSink {
    fn write_fragment(&mut self, fragment: &str) -> io::Result<()> {
        print!("{fragment}");
        io::stdout().flush()?;
        self.writer.write_all(fragment.as_bytes())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for SessionSink {
    fn drop(&mut self) {
        // BufWriter flushes on drop too, but that swallows errors silently;
        // an explicit flush lets us at least log them.
        if let Err(err) = self.writer.flush() {
            debug!("session flush on drop failed: {err}");
        }
    }
}

/// Test sink that records fragments in memory.
#[cfg(test)]
#[derive(Default)]
pub struct VecSink {
    pub fragments: Vec<String>,
    pub finished: bool,
}

#[cfg(test)]
impl FragmentSink for VecSink {
    fn write_fragment(&mut self, fragment: &str) -> io::Result<()> {
        self.fragments.push(fragment.to_string());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}
