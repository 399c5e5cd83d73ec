//! Sequential sweep execution with per-cell fault containment
//!
//! Each grid cell gets exactly one request. A failing request is recorded as
//! [`Outcome::Failure`] and the sweep moves on, so the returned records always
//! line up 1:1 with the grid.

use crate::client::CompletionClient;
use crate::error::CompletionError;
use crate::model::{Outcome, ParameterSet, PromptContext, ResultRecord};

/// Progress callback for sweeps
///
/// Arguments: (`completed_cells`, `total_cells`, record just produced)
pub type ProgressCallback = Box<dyn Fn(usize, usize, &ResultRecord) + Send + Sync>;

/// Run one request per grid cell, in grid order
pub fn run_sweep<C>(
    grid: &[ParameterSet],
    context: &PromptContext,
    client: &C,
) -> Vec<ResultRecord>
where
    C: CompletionClient + ?Sized,
{
    run_sweep_with_progress(grid, context, client, None)
}

/// Same as [`run_sweep`], reporting after every cell
pub fn run_sweep_with_progress<C>(
    grid: &[ParameterSet],
    context: &PromptContext,
    client: &C,
    progress_callback: Option<ProgressCallback>,
) -> Vec<ResultRecord>
where
    C: CompletionClient + ?Sized,
{
    let total = grid.len();
    let mut records = Vec::with_capacity(total);

    tracing::info!(
        model = context.model_id(),
        cells = total,
        "Starting parameter sweep"
    );

    for (index, parameters) in grid.iter().enumerate() {
        let outcome = match client.complete(&context.request(parameters)) {
            Ok(text) => {
                tracing::debug!(cell = index, ?parameters, "Completion succeeded");
                Outcome::Success(text)
            }
            Err(e) => {
                tracing::warn!(cell = index, ?parameters, error = %e, "Completion failed");
                Outcome::Failure(e.to_string())
            }
        };

        let record = ResultRecord::new(*parameters, outcome);
        if let Some(ref callback) = progress_callback {
            callback(index + 1, total, &record);
        }
        records.push(record);
    }

    let summary = SweepSummary::from_records(&records);
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Parameter sweep finished"
    );

    records
}

/// Single-shot generation; unlike a sweep, the error reaches the caller
pub fn generate<C>(
    context: &PromptContext,
    parameters: &ParameterSet,
    client: &C,
) -> Result<String, CompletionError>
where
    C: CompletionClient + ?Sized,
{
    tracing::debug!(model = context.model_id(), ?parameters, "Generating single completion");
    client.complete(&context.request(parameters))
}

/// Success/failure counts for a finished sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SweepSummary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let succeeded = records.iter().filter(|r| r.outcome().is_success()).count();
        Self {
            total: records.len(),
            succeeded,
            failed: records.len() - succeeded,
        }
    }
}
