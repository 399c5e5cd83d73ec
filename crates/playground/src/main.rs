use clap::Parser;
use playground::{Cli, app, init_logging};
use std::path::PathBuf;

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".playground")
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // OPENAI_API_KEY may live in a .env next to the working directory
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

    init_logging(&data_dir, &cli.log_level)?;

    let result = app::run(cli.command, &data_dir);
    if let Err(ref err) = result {
        tracing::error!("Command failed: {err}");
    }

    tracing::info!("Playground shutting down");
    result
}
