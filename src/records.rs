// MCPTT-SWEEP: Parameter Sweeps and Latency CDFs for Sidelink MCPTT Simulations
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Module defining the schema of the latency traces written by the simulator.
//!
//! A trace is a whitespace-delimited text file. Lines starting with the comment prefix are
//! ignored. Every other line is a record whose columns are located by their position:
//!
//! ```text
//! # time(s)  nodeId  callId  callType  latency(s)
//! 2.317      3       1       1         0.0563
//! ```

use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::Path,
    str::FromStr,
};

use thiserror::Error;

/// Error thrown while loading a trace.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Cannot read {file}: {source}")]
    Io { file: String, source: io::Error },
    #[error("{file}, line {line}: column `{column}` (index {index}) is missing, found only {found} columns")]
    MissingColumn {
        file: String,
        line: usize,
        column: &'static str,
        index: usize,
        found: usize,
    },
    #[error("{file}, line {line}: cannot parse `{value}` as `{column}`")]
    InvalidValue {
        file: String,
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// One row of a latency trace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencyRecord {
    /// Identifier of the call type, see [`crate::cdf::Cohort::classify`].
    pub call_type: i64,
    /// Measured latency in seconds.
    pub latency: f64,
}

impl LatencyRecord {
    pub fn latency_ms(&self) -> f64 {
        self.latency * 1000.0
    }
}

/// Positions of the named columns within a trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatencySchema {
    pub call_type_column: usize,
    pub latency_column: usize,
    pub comment_prefix: String,
}

impl Default for LatencySchema {
    /// Layout of the mouth-to-ear latency trace.
    fn default() -> Self {
        Self {
            call_type_column: 3,
            latency_column: 4,
            comment_prefix: "#".to_string(),
        }
    }
}

impl LatencySchema {
    /// Parse a single line. Returns `None` for comments and blank lines.
    pub fn parse_line(
        &self,
        file: &str,
        line_nr: usize,
        line: &str,
    ) -> Result<Option<LatencyRecord>, RecordError> {
        if line.starts_with(&self.comment_prefix) || line.trim().is_empty() {
            return Ok(None);
        }
        let columns: Vec<&str> = line.split_whitespace().collect();

        let call_type: i64 = column(file, line_nr, &columns, "call_type", self.call_type_column)?;
        let latency: f64 = column(file, line_nr, &columns, "latency", self.latency_column)?;
        if !latency.is_finite() {
            return Err(RecordError::InvalidValue {
                file: file.to_string(),
                line: line_nr,
                column: "latency",
                value: columns[self.latency_column].to_string(),
            });
        }

        Ok(Some(LatencyRecord { call_type, latency }))
    }

    /// Read all records, failing on the first malformed line. `file` is only used for error
    /// messages.
    pub fn read_records<R: BufRead>(
        &self,
        reader: R,
        file: &str,
    ) -> Result<Vec<LatencyRecord>, RecordError> {
        let mut records = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| RecordError::Io {
                file: file.to_string(),
                source,
            })?;
            if let Some(record) = self.parse_line(file, i + 1, &line)? {
                records.push(record);
            }
        }
        log::debug!("Loaded {} records from {file}", records.len());
        Ok(records)
    }

    /// Load all records of the trace at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<LatencyRecord>, RecordError> {
        let file = path.as_ref().display().to_string();
        log::info!("Loading: {file}");
        let f = fs::File::open(path.as_ref()).map_err(|source| RecordError::Io {
            file: file.clone(),
            source,
        })?;
        self.read_records(BufReader::new(f), &file)
    }
}

fn column<T: FromStr>(
    file: &str,
    line: usize,
    columns: &[&str],
    name: &'static str,
    index: usize,
) -> Result<T, RecordError> {
    let value = columns.get(index).ok_or_else(|| RecordError::MissingColumn {
        file: file.to_string(),
        line,
        column: name,
        index,
        found: columns.len(),
    })?;
    value.parse().map_err(|_| RecordError::InvalidValue {
        file: file.to_string(),
        line,
        column: name,
        value: value.to_string(),
    })
}
