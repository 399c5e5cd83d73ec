//! File-only tracing setup
//!
//! Stdout carries generated text and tables, so every event goes to
//! `playground.log` in the data directory instead.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "playground.log";

const TRUNCATION_MARKER: &[u8] = b"--- older entries truncated ---\n";

/// How much of the log survives between runs
#[derive(Debug, Clone, Copy)]
struct Retention {
    /// Truncate once the file is larger than this
    max_bytes: u64,
    /// Newest bytes kept after truncation (rounded down to whole lines)
    keep_bytes: u64,
}

const RETENTION: Retention = Retention {
    max_bytes: 5 * 1024 * 1024,
    keep_bytes: 1024 * 1024,
};

impl Retention {
    /// Returns whether the file was truncated
    fn enforce(self, path: &Path) -> io::Result<bool> {
        let len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if len <= self.max_bytes {
            return Ok(false);
        }

        let mut tail = Vec::new();
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(len.saturating_sub(self.keep_bytes)))?;
        file.read_to_end(&mut tail)?;

        let first_whole_line = tail.iter().position(|&b| b == b'\n').map_or(0, |i| i + 1);

        let mut file = File::create(path)?;
        file.write_all(TRUNCATION_MARKER)?;
        file.write_all(&tail[first_whole_line..])?;
        Ok(true)
    }
}

fn filter_directives(level: &str) -> String {
    format!("playground={level},playground_core={level}")
}

/// Send tracing output for both crates to `{data_dir}/playground.log`
///
/// `RUST_LOG` overrides `level` when set.
pub fn init_logging(data_dir: &Path, level: &str) -> color_eyre::Result<()> {
    fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join(LOG_FILE_NAME);

    let truncated = RETENTION.enforce(&log_path).unwrap_or_else(|e| {
        eprintln!("Warning: could not truncate {}: {e}", log_path.display());
        false
    });

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();

    tracing::info!(path = %log_path.display(), truncated, "Logging initialized");
    Ok(())
}
