//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "playground")]
#[command(about = "Explore how sampling parameters shape chat completions")]
pub struct Cli {
    /// Path to the data directory (default: ~/.playground/)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a single description with explicit parameters
    Generate(GenerateArgs),
    /// Generate descriptions for every combination of the sweep axes and save them
    Sweep(SweepArgs),
    /// List selectable models
    Models,
    /// Write a default config.yaml to the data directory
    InitConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Prompt overrides shared by `generate` and `sweep`
#[derive(Args, Debug, Default, Clone)]
pub struct PromptArgs {
    /// Product or subject substituted for {product} (e.g. iPhone, Tesla, running shoes)
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Model id; must be one of the configured models
    #[arg(short, long)]
    pub model: Option<String>,

    #[arg(long)]
    pub system_prompt: Option<String>,

    #[arg(long)]
    pub user_prompt: Option<String>,

    /// Stop sequence (empty for none)
    #[arg(long, allow_hyphen_values = true)]
    pub stop: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub prompt: PromptArgs,

    #[arg(short, long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    pub presence_penalty: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub frequency_penalty: Option<f64>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub prompt: PromptArgs,

    /// Directory for the results table (default: config output_dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
