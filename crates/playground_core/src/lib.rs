//! Sampling-parameter sweep engine for chat completion endpoints
//!
//! This crate drives the "generate all" mode of the prompt playground:
//! - Deterministic grids over temperature, max tokens and the two penalties
//! - Sequential execution against an injected completion client, one request per cell
//! - Per-cell fault containment (a failed request becomes a row, not an abort)
//! - Table rendering and atomic CSV persistence of the results
//!
//! # Example
//!
//! ```ignore
//! use playground_core::{OpenAiClient, PromptContext, SweepAxes, render_and_persist, run_sweep};
//!
//! let client = OpenAiClient::new(api_key);
//! let context = PromptContext::new("gpt-4", system_prompt, user_prompt);
//! let records = run_sweep(&SweepAxes::default().grid(), &context, &client);
//! let report = render_and_persist(&records, Path::new("."), "iPhone");
//! println!("{}", report.table.render());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod client;
pub mod error;
pub mod grid;
pub mod sink;
pub mod sweep;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use client::{CompletionClient, CompletionRequest, DEFAULT_API_BASE, OpenAiClient};
pub use error::{CompletionError, SinkError};
pub use grid::{SweepAxes, build_grid};
pub use model::{Outcome, ParameterSet, PromptContext, ResultRecord};
pub use sink::{ResultTable, SinkReport, TableRow, output_filename, render_and_persist};
pub use sweep::{ProgressCallback, SweepSummary, generate, run_sweep, run_sweep_with_progress};
