use crate::error::AppError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How file contents are turned into prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Verbatim fenced code blocks.
    Original,
    /// Per-file summaries produced by the model service.
    Llm,
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "original" => Ok(Strategy::Original),
            "llm" => Ok(Strategy::Llm),
            other => Err(AppError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Original => write!(f, "original"),
            Strategy::Llm => write!(f, "llm"),
        }
    }
}

/// Per-run settings for the prompt-building path. Immutable once built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub code_path: PathBuf,
    pub strategy: Strategy,
    pub prompt_prefix: String,
    pub prompt_suffix: String,
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            code_path: PathBuf::from("."),
            strategy: Strategy::Original,
            prompt_prefix: "The following describes the code:".to_string(),
            prompt_suffix: "Analyze the code described above.".to_string(),
            output_dir: PathBuf::from("./.output"),
        }
    }
}

/// Connection settings for the model service.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl LlmSettings {
    /// Resolves credentials with the precedence: explicit argument, then
    /// `API_KEY`/`BASE_URL`, then `ONEAPI_API_KEY`/`ONEAPI_BASE_URL`, then
    /// empty. The first non-empty value wins.
    pub fn resolve(api_key: Option<String>, base_url: Option<String>, model: String) -> Self {
        Self {
            api_key: first_non_empty(api_key, &["API_KEY", "ONEAPI_API_KEY"]),
            base_url: first_non_empty(base_url, &["BASE_URL", "ONEAPI_BASE_URL"]),
            model,
        }
    }
}

fn first_non_empty(explicit: Option<String>, env_keys: &[&str]) -> String {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| {
            env_keys
                .iter()
                .filter_map(|key| std::env::var(key).ok())
                .find(|v| !v.is_empty())
        })
        .unwrap_or_default()
}
