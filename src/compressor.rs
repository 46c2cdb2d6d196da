use crate::client::LlmClient;
use crate::config::{LlmSettings, Strategy};
use crate::error::AppError;
use crate::loader::CodeMap;
use crate::prompt::DescriptionMap;
use async_trait::async_trait;
use log::{info, warn};
use std::time::Duration;

/// Default bound on a single summarization call.
pub const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns a mapping of file contents into a mapping of textual descriptions.
///
/// Implementations must preserve the key set exactly: no file may be dropped
/// and no filename invented, whatever happens to individual entries.
#[async_trait]
pub trait Compressor {
    async fn compress(&self, code: &CodeMap) -> DescriptionMap;
}

/// Wraps each file's content verbatim in a fenced display block.
pub struct OriginalStrategy;

#[async_trait]
impl Compressor for OriginalStrategy {
    async fn compress(&self, code: &CodeMap) -> DescriptionMap {
        code.iter()
            .map(|(path, content)| {
                (
                    path.clone(),
                    format!("Original code:\n```\n{content}\n```"),
                )
            })
            .collect()
    }
}

/// Asks the model service for a per-file functional summary.
///
/// Each file is one chat call bounded by `timeout`. A failed or timed-out
/// call degrades that entry to a placeholder so the remaining files still
/// produce descriptions.
pub struct LlmStrategy {
    client: LlmClient,
    timeout: Duration,
}

impl LlmStrategy {
    pub fn new(client: LlmClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn summary_prompt(path: &std::path::Path, content: &str) -> String {
        format!(
            "Summarize the file `{}`: one line per function describing what it \
             does, followed by the call relationships between the functions.\n\
             ```\n{}\n```",
            path.display(),
            content
        )
    }
}

#[async_trait]
impl Compressor for LlmStrategy {
    async fn compress(&self, code: &CodeMap) -> DescriptionMap {
        let mut descriptions = DescriptionMap::new();
        for (path, content) in code {
            info!("summarizing {} with {}", path.display(), self.client.model());
            let prompt = Self::summary_prompt(path, content);
            let description =
                match tokio::time::timeout(self.timeout, self.client.complete(&prompt)).await {
                    Ok(Ok(summary)) => summary,
                    Ok(Err(err)) => {
                        warn!("summarization failed for {}: {err}", path.display());
                        format!("(summary unavailable: {err})")
                    }
                    Err(_) => {
                        warn!(
                            "summarization timed out for {} after {:?}",
                            path.display(),
                            self.timeout
                        );
                        format!("(summary unavailable: timed out after {:?})", self.timeout)
                    }
                };
            descriptions.insert(path.clone(), description);
        }
        descriptions
    }
}

/// Builds the compressor for a strategy. Fails with a configuration error
/// before any file or network I/O when the strategy needs a client that
/// cannot be constructed.
pub fn create_compressor(
    strategy: Strategy,
    llm: &LlmSettings,
    timeout: Duration,
) -> Result<Box<dyn Compressor>, AppError> {
    match strategy {
        Strategy::Original => Ok(Box::new(OriginalStrategy)),
        Strategy::Llm => {
            let client = LlmClient::new(llm.clone())?;
            Ok(Box::new(LlmStrategy::new(client, timeout)))
        }
    }
}
