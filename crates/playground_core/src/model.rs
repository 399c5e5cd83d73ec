//! Data types shared by the grid builder, the sweep executor and the sink.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::client::CompletionRequest;

/// One combination of sampling parameters (a single grid cell)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    temperature: f64,
    max_tokens: u32,
    presence_penalty: f64,
    frequency_penalty: f64,
}

impl ParameterSet {
    #[must_use]
    pub fn new(
        temperature: f64,
        max_tokens: u32,
        presence_penalty: f64,
        frequency_penalty: f64,
    ) -> Self {
        Self {
            temperature,
            max_tokens,
            presence_penalty,
            frequency_penalty,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn presence_penalty(&self) -> f64 {
        self.presence_penalty
    }

    pub fn frequency_penalty(&self) -> f64 {
        self.frequency_penalty
    }
}

/// The fixed part of every request in a sweep
///
/// `user_text` is used verbatim; any placeholder substitution happens
/// before the context is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    model_id: String,
    system_text: String,
    user_text: String,
    stop_sequence: Option<String>,
}

impl PromptContext {
    pub fn new(
        model_id: impl Into<String>,
        system_text: impl Into<String>,
        user_text: impl Into<String>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            system_text: system_text.into(),
            user_text: user_text.into(),
            stop_sequence: None,
        }
    }

    /// Set the stop sequence. An empty string means "no stop sequence".
    #[must_use]
    pub fn with_stop_sequence(mut self, stop: Option<impl Into<String>>) -> Self {
        let stop: Option<String> = stop.map(Into::into);
        self.stop_sequence = stop.filter(|s| !s.is_empty());
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn system_text(&self) -> &str {
        &self.system_text
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    pub fn stop_sequence(&self) -> Option<&str> {
        self.stop_sequence.as_deref()
    }

    /// Merge a grid cell into the fixed fields
    pub fn request(&self, parameters: &ParameterSet) -> CompletionRequest<'_> {
        CompletionRequest {
            model: &self.model_id,
            system: &self.system_text,
            user: &self.user_text,
            parameters: *parameters,
            stop: self.stop_sequence.as_deref(),
        }
    }
}

/// What happened to a single grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Generated text
    Success(String),
    /// Human-readable description of the completion error
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Text shown in the Description column
    pub fn description(&self) -> Cow<'_, str> {
        match self {
            Outcome::Success(text) => Cow::Borrowed(text),
            Outcome::Failure(message) => Cow::Owned(format!("Error: {message}")),
        }
    }
}

/// Result of one grid cell, in grid order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    parameters: ParameterSet,
    outcome: Outcome,
}

impl ResultRecord {
    #[must_use]
    pub fn new(parameters: ParameterSet, outcome: Outcome) -> Self {
        Self {
            parameters,
            outcome,
        }
    }

    pub fn success(parameters: ParameterSet, text: impl Into<String>) -> Self {
        Self::new(parameters, Outcome::Success(text.into()))
    }

    pub fn failure(parameters: ParameterSet, message: impl Into<String>) -> Self {
        Self::new(parameters, Outcome::Failure(message.into()))
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}
