//! Command-line front-end for the prompt playground
//!
//! Wraps `playground_core` with:
//! - A clap CLI for single generations and full parameter sweeps
//! - A YAML config file in the data directory (model list, prompts, sweep axes)
//! - File-based tracing with size-capped rotation

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command};
pub use config::{ConfigError, PlaygroundConfig};
pub use logging::init_logging;
