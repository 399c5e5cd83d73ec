//! Playground configuration stored in `config.yaml`
//!
//! Directory structure:
//! ~/.playground/
//!   config.yaml          # Model, prompts, sweep axes, API endpoint
//!   playground.log       # Tracing output
//!   .env                 # Optional OPENAI_API_KEY fallback
//!
//! Every field has a default, so a missing or partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use playground_core::{DEFAULT_API_BASE, ParameterSet, SweepAxes};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Placeholder in the user prompt replaced by the subject
pub const SUBJECT_PLACEHOLDER: &str = "{product}";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional product description writer. \
    Write engaging and detailed product descriptions that highlight key features and benefits.";

const DEFAULT_USER_PROMPT: &str =
    "Write a detailed product description that highlights its key features and benefits.";

/// Errors raised while loading or checking configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("config file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("unknown model '{model}' (available: {available})")]
    UnknownModel { model: String, available: String },

    #[error("sweep axis '{0}' has no values")]
    EmptyAxis(&'static str),

    #[error("{name} must be between {min} and {max} (got {value})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("max tokens must be positive")]
    ZeroMaxTokens,

    #[error("request timeout must be positive")]
    ZeroTimeout,
}

/// Single-shot generation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub temperature: f64,
    pub max_tokens: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 150,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Model used when `--model` is not given
    pub model: String,
    /// Models that may be selected
    pub models: Vec<String>,
    pub system_prompt: String,
    /// May contain `{product}`
    pub user_prompt: String,
    /// Default subject, also names the sweep output file
    pub subject: String,
    /// Empty means no stop sequence
    pub stop_sequence: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
    /// Where sweep tables are written
    pub output_dir: PathBuf,
    pub generation: GenerationDefaults,
    pub axes: SweepAxes,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            models: vec!["gpt-3.5-turbo".into(), "gpt-4".into()],
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            user_prompt: DEFAULT_USER_PROMPT.into(),
            subject: "iPhone".into(),
            stop_sequence: String::new(),
            api_base: DEFAULT_API_BASE.into(),
            request_timeout_secs: 60,
            output_dir: PathBuf::from("."),
            generation: GenerationDefaults::default(),
            axes: SweepAxes::default(),
        }
    }
}

impl PlaygroundConfig {
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Load `config.yaml` from the data directory, falling back to defaults if absent
    pub fn load_or_default(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(data_dir);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("Failed to read config: {}", e)))?;

        serde_saphyr::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Write this config to the data directory
    pub fn save(&self, data_dir: &Path) -> Result<PathBuf, ConfigError> {
        fs::create_dir_all(data_dir)
            .map_err(|e| ConfigError::Io(format!("Failed to create data directory: {}", e)))?;

        let yaml = serde_saphyr::to_string(self)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize config: {}", e)))?;

        let path = Self::path(data_dir);
        fs::write(&path, yaml)
            .map_err(|e| ConfigError::Io(format!("Failed to write config: {}", e)))?;
        Ok(path)
    }

    pub fn check_model(&self, model: &str) -> Result<(), ConfigError> {
        if self.models.iter().any(|m| m == model) {
            Ok(())
        } else {
            Err(ConfigError::UnknownModel {
                model: model.to_string(),
                available: self.models.join(", "),
            })
        }
    }

    /// HTTP timeout for one completion request; zero would fail every call
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        match self.request_timeout_secs {
            0 => Err(ConfigError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Every axis must be non-empty and every value in range
    pub fn check_axes(&self) -> Result<(), ConfigError> {
        if let Some(axis) = self.axes.empty_axis() {
            return Err(ConfigError::EmptyAxis(axis));
        }
        for &value in &self.axes.temperatures {
            check_range("temperature", value, TEMPERATURE_RANGE)?;
        }
        if self.axes.max_tokens.contains(&0) {
            return Err(ConfigError::ZeroMaxTokens);
        }
        for &value in &self.axes.presence_penalties {
            check_range("presence penalty", value, PENALTY_RANGE)?;
        }
        for &value in &self.axes.frequency_penalties {
            check_range("frequency penalty", value, PENALTY_RANGE)?;
        }
        Ok(())
    }
}

const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
const PENALTY_RANGE: (f64, f64) = (-2.0, 2.0);

fn check_range(
    name: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Reject parameters the completion API would refuse
pub fn check_parameters(p: &ParameterSet) -> Result<(), ConfigError> {
    check_range("temperature", p.temperature(), TEMPERATURE_RANGE)?;
    if p.max_tokens() == 0 {
        return Err(ConfigError::ZeroMaxTokens);
    }
    check_range("presence penalty", p.presence_penalty(), PENALTY_RANGE)?;
    check_range("frequency penalty", p.frequency_penalty(), PENALTY_RANGE)?;
    Ok(())
}

/// Substitute the subject into a user prompt
pub fn fill_subject(user_prompt: &str, subject: &str) -> String {
    user_prompt.replace(SUBJECT_PLACEHOLDER, subject)
}
