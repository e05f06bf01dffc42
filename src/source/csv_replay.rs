//! Replay of recorded traces.
//!
//! A trace is a CSV file with a header row and two columns:
//!
//! ```text
//! timestamp_ms,value
//! 100,0.04
//! 200,0.08
//! ```
//!
//! Rows are yielded in file order. Malformed rows surface as
//! `BreathError::Csv` and end the run.
use crate::analysis::window::Sample;
use crate::error::BreathResult;
use crate::source::SampleSource;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Record {
    timestamp_ms: i64,
    value: f64,
}

/// Sample source reading `timestamp_ms,value` records.
pub struct CsvReplay<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, Record>,
    interval_ms: u64,
    label: String,
}

impl CsvReplay<File> {
    /// Open a trace file.
    pub fn open<P: AsRef<Path>>(path: P, interval_ms: u64) -> BreathResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut replay = Self::from_reader(file, interval_ms);
        replay.label = format!("replay of {}", path.display());
        Ok(replay)
    }
}

impl<R: Read> CsvReplay<R> {
    /// Read a trace from any reader.
    pub fn from_reader(reader: R, interval_ms: u64) -> Self {
        let records = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_deserialize();
        Self {
            records,
            interval_ms,
            label: "replay".to_string(),
        }
    }
}

impl<R: Read> SampleSource for CsvReplay<R> {
    fn next_sample(&mut self) -> Option<BreathResult<Sample>> {
        let record = self.records.next()?;
        Some(
            record
                .map(|r: Record| Sample::new(r.value, r.timestamp_ms))
                .map_err(Into::into),
        )
    }

    fn nominal_interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
