//! # codeprompt
//!
//! This crate can be used to:
//!
//! - Collect source files from a path, compress them (verbatim blocks or
//!   LLM-produced summaries) and merge the result into a single prompt
//! - Send that prompt to an OpenAI-compatible chat endpoint, streaming the
//!   response to stdout and to a timestamped session file
//! - Extract `(filename, code)` pairs back out of a markdown response and
//!   materialize them as files
//!
//! ## Building a prompt
//!
//! ```no_run
//! use codeprompt::{build_prompt, LlmSettings, Settings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::default();
//!     let llm = LlmSettings::resolve(None, None, "claude-3-5-sonnet".into());
//!     let prompt = build_prompt(&settings, &llm).await?;
//!     println!("{prompt}");
//!     Ok(())
//! }
//! ```
//!
//! ## Extracting files from a markdown response
//!
//! ```no_run
//! use codeprompt::extract_and_write_code;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let markdown = std::fs::read_to_string("sessions/temp-20250116121254.md")?;
//!     extract_and_write_code(&markdown, Path::new("./.output"))?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod compressor;
pub mod config;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod prompt;
pub mod session;
pub mod utils;

pub use cli::Config;
pub use client::LlmClient;
pub use compressor::{create_compressor, Compressor, LlmStrategy, OriginalStrategy};
pub use config::{LlmSettings, Settings, Strategy};
pub use error::AppError;
pub use extractor::{extract_and_write_code, parse_markdown, CodeSnippet, ExtractReport};
pub use loader::{load_code, CodeMap};
pub use prompt::{create_prompt, merge_code, merge_code_descriptions, DescriptionMap};
pub use session::{session_path, FragmentSink, SessionSink};

use anyhow::{Context, Result};
use compressor::DEFAULT_FILE_TIMEOUT;
use log::{info, warn};

/// Loads code from `settings.code_path` and produces the final prompt text.
///
/// With the `original` strategy the raw per-file code blocks are merged; with
/// the `llm` strategy each file is first summarized by the model service.
pub async fn build_prompt(settings: &Settings, llm: &LlmSettings) -> Result<String> {
    let code = load_code(&settings.code_path)
        .with_context(|| format!("failed to load code from {}", settings.code_path.display()))?;
    info!("loaded {} file(s)", code.len());

    let merged = match settings.strategy {
        Strategy::Original => merge_code(&code),
        Strategy::Llm => {
            let compressor = create_compressor(settings.strategy, llm, DEFAULT_FILE_TIMEOUT)?;
            let descriptions = compressor.compress(&code).await;
            merge_code_descriptions(&descriptions)
        }
    };

    Ok(create_prompt(
        &merged,
        &settings.prompt_prefix,
        &settings.prompt_suffix,
    ))
}

/// Runs one CLI invocation: either the reverse path (extract a markdown file
/// to disk) or the forward path (build a prompt and print or send it).
pub async fn run(config: Config) -> Result<()> {
    if let Some(input) = &config.extract_input {
        let markdown = tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("failed to read {}", input.display()))?;
        let report = extract_and_write_code(&markdown, &config.settings.output_dir)?;
        info!(
            "extracted {} file(s) into {}",
            report.written.len(),
            config.settings.output_dir.display()
        );
        if !report.is_complete() {
            warn!("{} file(s) could not be written", report.failed.len());
        }
        return Ok(());
    }

    let llm = LlmSettings::resolve(
        config.api_key.clone(),
        config.base_url.clone(),
        config.model.clone(),
    );
    let prompt = build_prompt(&config.settings, &llm).await?;

    if !config.send {
        println!("{prompt}");
        return Ok(());
    }

    let client = LlmClient::new(llm)?;
    let mut sink = SessionSink::create(&config.session_dir)?;
    if config.no_stream {
        let response = client.complete(&prompt).await?;
        sink.write_fragment(&response)?;
        sink.finish()?;
    } else {
        client.stream(&prompt, &mut sink).await?;
    }
    println!();
    info!("session saved to {}", sink.path().display());
    Ok(())
}
