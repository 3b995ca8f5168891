//! Structured run log: one JSON object per line, tagged by `type`.
//!
//! ```text
//! {"type":"header","n":"1073217479",...}
//! {"type":"progress","tested":1000,...}
//! {"type":"success","p":"32749","q":"32771",...}
//! {"type":"completion","outcome":"factored",...}
//! ```
//!
//! Big integers are written as decimal strings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunRecord {
    Header {
        n: String,
        sqrt_n: String,
        bits: u64,
        precision_digits: u32,
        delta_max: u64,
        num_bands: usize,
        k_value: f64,
        max_candidates: Option<u64>,
        timeout_secs: Option<f64>,
    },
    Progress {
        tested: u64,
        elapsed_secs: f64,
        band_index: usize,
        offset: i64,
        candidates_per_sec: f64,
    },
    Success {
        p: String,
        q: String,
        tested: u64,
        elapsed_secs: f64,
        band_index: usize,
        offset: i64,
        amplitude: f64,
    },
    Completion {
        outcome: String,
        tested: u64,
        elapsed_secs: f64,
    },
}

impl RunRecord {
    /// The `type` tag this record serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            RunRecord::Header { .. } => "header",
            RunRecord::Progress { .. } => "progress",
            RunRecord::Success { .. } => "success",
            RunRecord::Completion { .. } => "completion",
        }
    }
}

/// Receives run records as the search driver produces them.
pub trait RunObserver {
    fn record(&mut self, record: &RunRecord) -> Result<(), SearchError>;
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl RunObserver for NullLog {
    fn record(&mut self, _record: &RunRecord) -> Result<(), SearchError> {
        Ok(())
    }
}

/// Keeps records in memory.
impl RunObserver for Vec<RunRecord> {
    fn record(&mut self, record: &RunRecord) -> Result<(), SearchError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes records as JSON lines, flushing after each one so a killed run
/// still leaves a readable log.
#[derive(Debug)]
pub struct JsonlLog<W: Write> {
    out: W,
    written: u64,
}

impl JsonlLog<BufWriter<File>> {
    /// Create (or truncate) the log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let file = File::create(path)?;
        Ok(JsonlLog::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlLog<W> {
    pub fn new(out: W) -> Self {
        JsonlLog { out, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RunObserver for JsonlLog<W> {
    fn record(&mut self, record: &RunRecord) -> Result<(), SearchError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }
}

/// Parse a JSONL run log back into records.
pub fn read_jsonl(text: &str) -> Result<Vec<RunRecord>, SearchError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(SearchError::from))
        .collect()
}
