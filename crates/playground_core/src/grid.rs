//! Grid construction for parameter sweeps
//!
//! The grid is the full cross-product of the four sampling axes, enumerated
//! with temperature outermost and frequency penalty innermost. Enumeration
//! order is part of the contract: result tables line up row-for-row across
//! runs with the same axes.

use serde::{Deserialize, Serialize};

use crate::model::ParameterSet;

/// Build every combination of the given axis values
///
/// The result has `T * M * P * F` entries. Axes are used in the order given.
pub fn build_grid(
    temperatures: &[f64],
    max_tokens: &[u32],
    presence_penalties: &[f64],
    frequency_penalties: &[f64],
) -> Vec<ParameterSet> {
    let mut grid = Vec::with_capacity(
        temperatures.len()
            * max_tokens.len()
            * presence_penalties.len()
            * frequency_penalties.len(),
    );

    for &temperature in temperatures {
        for &tokens in max_tokens {
            for &presence in presence_penalties {
                for &frequency in frequency_penalties {
                    grid.push(ParameterSet::new(temperature, tokens, presence, frequency));
                }
            }
        }
    }

    grid
}

/// The four axes of a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepAxes {
    pub temperatures: Vec<f64>,
    pub max_tokens: Vec<u32>,
    pub presence_penalties: Vec<f64>,
    pub frequency_penalties: Vec<f64>,
}

impl Default for SweepAxes {
    /// The stock 3x3x3x3 grid (81 cells)
    fn default() -> Self {
        Self {
            temperatures: vec![0.0, 0.7, 1.2],
            max_tokens: vec![50, 150, 300],
            presence_penalties: vec![0.0, 0.5, 1.0],
            frequency_penalties: vec![0.0, 0.5, 1.0],
        }
    }
}

impl SweepAxes {
    pub fn grid(&self) -> Vec<ParameterSet> {
        build_grid(
            &self.temperatures,
            &self.max_tokens,
            &self.presence_penalties,
            &self.frequency_penalties,
        )
    }

    pub fn cell_count(&self) -> usize {
        self.temperatures.len()
            * self.max_tokens.len()
            * self.presence_penalties.len()
            * self.frequency_penalties.len()
    }

    /// Name of the first empty axis, if any
    pub fn empty_axis(&self) -> Option<&'static str> {
        if self.temperatures.is_empty() {
            Some("temperatures")
        } else if self.max_tokens.is_empty() {
            Some("max_tokens")
        } else if self.presence_penalties.is_empty() {
            Some("presence_penalties")
        } else if self.frequency_penalties.is_empty() {
            Some("frequency_penalties")
        } else {
            None
        }
    }
}
