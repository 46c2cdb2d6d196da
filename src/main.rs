use anyhow::Result;
use codeprompt::{cli::parse_args, run};

#[tokio::main]
async fn main() -> Result<()> {
    let config = parse_args()?;

    let level = match config.verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(config).await
}
