//! Result table rendering and persistence
//!
//! A sweep's records become a five-column table (Temperature, Max Tokens,
//! Presence Penalty, Frequency Penalty, Description). The table is written as
//! CSV to `<subject>_all_descriptions.csv`; existing files are overwritten.
//!
//! Writes go through a temporary file in the target directory that is renamed
//! into place, so readers never observe a half-written table.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::SinkError;
use crate::model::ResultRecord;

/// Header row, in column order
pub const COLUMNS: [&str; 5] = [
    "Temperature",
    "Max Tokens",
    "Presence Penalty",
    "Frequency Penalty",
    "Description",
];

const FILENAME_SUFFIX: &str = "_all_descriptions.csv";

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Max Tokens")]
    pub max_tokens: u32,
    #[serde(rename = "Presence Penalty")]
    pub presence_penalty: f64,
    #[serde(rename = "Frequency Penalty")]
    pub frequency_penalty: f64,
    #[serde(rename = "Description")]
    pub description: String,
}

impl From<&ResultRecord> for TableRow {
    fn from(record: &ResultRecord) -> Self {
        let params = record.parameters();
        Self {
            temperature: params.temperature(),
            max_tokens: params.max_tokens(),
            presence_penalty: params.presence_penalty(),
            frequency_penalty: params.frequency_penalty(),
            description: record.outcome().description().into_owned(),
        }
    }
}

impl TableRow {
    fn cells(&self) -> [String; 5] {
        [
            format_number(self.temperature),
            self.max_tokens.to_string(),
            format_number(self.presence_penalty),
            format_number(self.frequency_penalty),
            self.description
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        ]
    }
}

/// Whole numbers keep one decimal so the float columns read as floats
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Ordered results table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        Self {
            rows: records.iter().map(TableRow::from).collect(),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Aligned plain-text rendering for the terminal
    ///
    /// Whitespace runs inside descriptions (including newlines) are collapsed
    /// to single spaces so each record stays on one line.
    pub fn render(&self) -> String {
        let cells: Vec<[String; 5]> = self.rows.iter().map(TableRow::cells).collect();

        let mut widths = COLUMNS.map(|c| c.chars().count());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &COLUMNS.map(String::from), &widths);
        push_line(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
        for row in &cells {
            push_line(&mut out, row, &widths);
        }
        out
    }

    /// Write the table as CSV to `path`, replacing any existing file
    pub fn persist(&self, path: &Path) -> Result<(), SinkError> {
        let io_error = |source: std::io::Error| SinkError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file.as_file_mut());
            writer.write_record(COLUMNS)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush().map_err(io_error)?;
        }

        file.as_file().sync_all().map_err(io_error)?;
        file.persist(path).map_err(|e| io_error(e.error))?;

        tracing::info!(path = %path.display(), rows = self.rows.len(), "Results table saved");
        Ok(())
    }

    /// Read a table previously written by [`ResultTable::persist`]
    pub fn load(path: &Path) -> Result<Self, SinkError> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<TableRow>, csv::Error>>()?;
        Ok(Self { rows })
    }
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    let _ = writeln!(out, "{}", line.trim_end());
}

/// Sanitize a destination key to be safe for the filesystem
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name for a sweep over `destination_key`
pub fn output_filename(destination_key: &str) -> String {
    format!("{}{FILENAME_SUFFIX}", sanitize_filename(destination_key))
}

/// What [`render_and_persist`] produced
///
/// The table is always available, even when saving failed.
#[derive(Debug)]
pub struct SinkReport {
    pub table: ResultTable,
    pub saved: Result<PathBuf, SinkError>,
}

/// Build the results table and save it under `directory`
pub fn render_and_persist(
    results: &[ResultRecord],
    directory: &Path,
    destination_key: &str,
) -> SinkReport {
    let table = ResultTable::from_records(results);
    let path = directory.join(output_filename(destination_key));

    let saved = match table.persist(&path) {
        Ok(()) => Ok(path),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to save results table");
            Err(e)
        }
    };

    SinkReport { table, saved }
}
