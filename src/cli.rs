use crate::config::{Settings, Strategy};
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Parsed command-line configuration for one run.
pub struct Config {
    pub settings: Settings,
    pub extract_input: Option<PathBuf>,
    pub send: bool,
    pub no_stream: bool,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub session_dir: PathBuf,
    pub verbosity: u8,
}

pub fn parse_args() -> Result<Config> {
    let matches = Command::new("codeprompt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds LLM prompts from code and extracts code from markdown responses")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .help("Code file or directory to build the prompt from")
                .num_args(1),
        )
        .arg(
            Arg::new("strategy")
                .short('s')
                .long("strategy")
                .value_name("NAME")
                .help("Compression strategy: original or llm")
                .num_args(1),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("TEXT")
                .help("Text placed before the merged code")
                .num_args(1),
        )
        .arg(
            Arg::new("suffix")
                .long("suffix")
                .value_name("TEXT")
                .help("Text placed after the merged code")
                .num_args(1),
        )
        .arg(
            Arg::new("send")
                .long("send")
                .help("Send the prompt to the model instead of printing it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-stream")
                .long("no-stream")
                .help("Request the full response in one shot instead of streaming")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("NAME")
                .help("Model name for the chat-completion endpoint")
                .num_args(1),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("API key (falls back to API_KEY, then ONEAPI_API_KEY)")
                .num_args(1),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("API base URL (falls back to BASE_URL, then ONEAPI_BASE_URL)")
                .num_args(1),
        )
        .arg(
            Arg::new("extract")
                .short('x')
                .long("extract")
                .value_name("FILE")
                .help("Extract code blocks from a markdown file instead of building a prompt")
                .num_args(1),
        )
        .arg(
            Arg::new("out-dir")
                .short('o')
                .long("out-dir")
                .value_name("DIR")
                .help("Output directory for extracted files")
                .num_args(1),
        )
        .arg(
            Arg::new("session-dir")
                .long("session-dir")
                .value_name("DIR")
                .help("Directory for timestamped session files")
                .num_args(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v info, -vv debug)")
                .action(ArgAction::Count),
        )
        .get_matches();

    let defaults = Settings::default();

    let strategy: Strategy = matches
        .get_one::<String>("strategy")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(defaults.strategy);

    let settings = Settings {
        code_path: matches
            .get_one::<String>("path")
            .map(PathBuf::from)
            .unwrap_or(defaults.code_path),
        strategy,
        prompt_prefix: matches
            .get_one::<String>("prefix")
            .cloned()
            .unwrap_or(defaults.prompt_prefix),
        prompt_suffix: matches
            .get_one::<String>("suffix")
            .cloned()
            .unwrap_or(defaults.prompt_suffix),
        output_dir: matches
            .get_one::<String>("out-dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir),
    };

    Ok(Config {
        settings,
        extract_input: matches.get_one::<String>("extract").map(PathBuf::from),
        send: matches.get_flag("send"),
        no_stream: matches.get_flag("no-stream"),
        model: matches
            .get_one::<String>("model")
            .cloned()
            .unwrap_or_else(|| "claude-3-5-sonnet".to_string()),
        api_key: matches.get_one::<String>("api-key").cloned(),
        base_url: matches.get_one::<String>("base-url").cloned(),
        session_dir: matches
            .get_one::<String>("session-dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./sessions")),
        verbosity: matches.get_count("verbose"),
    })
}
