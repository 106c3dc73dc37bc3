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
//! Empirical CDFs of the latency samples, grouped into call-type cohorts.

use std::{
    collections::BTreeMap,
    fmt, io,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::records::LatencyRecord;

#[derive(Debug, Error)]
pub enum CdfError {
    /// Raised when summarizing a cohort without any sample.
    #[error("The {0} cohort has no samples.")]
    EmptyCohort(Cohort),
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{path:?} does not contain an empirical CDF: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Groups of calls, determined by the call type of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
pub enum Cohort {
    #[strum(serialize = "on network")]
    OnNetwork,
    #[strum(serialize = "off network")]
    OffNetwork,
    #[strum(serialize = "relay")]
    Relay,
}

impl Cohort {
    /// Call type `1` is on network, `2` is relayed, and everything above `2` is off network.
    /// Other call types are not classified.
    pub fn classify(call_type: i64) -> Option<Self> {
        match call_type {
            1 => Some(Self::OnNetwork),
            2 => Some(Self::Relay),
            x if x > 2 => Some(Self::OffNetwork),
            _ => None,
        }
    }

    /// Suffix used for the raw CDF exports.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Self::OnNetwork => "onNet",
            Self::OffNetwork => "offNet",
            Self::Relay => "relay",
        }
    }
}

/// Latency samples in milliseconds, per cohort.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CohortSamples {
    samples: BTreeMap<Cohort, Vec<f64>>,
}

impl CohortSamples {
    /// Classify the records and scale their latency to milliseconds. Records without a cohort are
    /// dropped.
    pub fn from_records(records: impl IntoIterator<Item = LatencyRecord>) -> Self {
        let mut samples: BTreeMap<Cohort, Vec<f64>> =
            Cohort::iter().map(|c| (c, Vec::new())).collect();
        let mut dropped = 0usize;
        for record in records {
            match Cohort::classify(record.call_type) {
                Some(cohort) => samples.entry(cohort).or_default().push(record.latency_ms()),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!("Dropped {dropped} records without a cohort");
        }
        Self { samples }
    }

    pub fn get(&self, cohort: Cohort) -> &[f64] {
        self.samples.get(&cohort).map(Vec::as_slice).unwrap_or_default()
    }

    /// Compute the empirical CDF of a cohort.
    pub fn cdf(&self, cohort: Cohort) -> Result<EmpiricalCdf, CdfError> {
        EmpiricalCdf::new(self.get(cohort).to_vec()).ok_or(CdfError::EmptyCohort(cohort))
    }
}

/// Step-function approximation of the distribution of a sample: the sorted values `x`, and the
/// ladder `y = 1/n, 2/n, ..., 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct EmpiricalCdf {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl EmpiricalCdf {
    /// Returns `None` if `samples` is empty.
    pub fn new(mut samples: Vec<f64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(f64::total_cmp);
        let n = samples.len() as f64;
        let y = (1..=samples.len()).map(|i| i as f64 / n).collect();
        Some(Self { x: samples, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.x[0]
    }

    pub fn max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Write the CDF as two tab-delimited rows: first `x`, then `y`. Values are written with the
    /// shortest representation that parses back to the same float.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), CdfError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(path.as_ref())?;
        writer.write_record(self.x.iter().map(f64::to_string))?;
        writer.write_record(self.y.iter().map(f64::to_string))?;
        writer.flush()?;
        Ok(())
    }

    /// Read a CDF written by [`EmpiricalCdf::write`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, CdfError> {
        let path = path.as_ref();
        let malformed = |reason: String| CdfError::Malformed {
            path: path.to_path_buf(),
            reason,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path)?;
        let rows = reader
            .records()
            .map(|record| {
                record?
                    .iter()
                    .map(|v| {
                        v.parse::<f64>()
                            .map_err(|_| malformed(format!("cannot parse `{v}`")))
                    })
                    .collect::<Result<Vec<f64>, CdfError>>()
            })
            .collect::<Result<Vec<_>, CdfError>>()?;
        let Some((x, y)) = rows.into_iter().collect_tuple() else {
            return Err(malformed("expected exactly two rows".to_string()));
        };
        if x.is_empty() {
            return Err(malformed("no values".to_string()));
        }
        Ok(Self { x, y })
    }
}

/// Number of samples, minimum and maximum of a cohort.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub cohort: Cohort,
    pub num: usize,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn new(cohort: Cohort, cdf: &EmpiricalCdf) -> Self {
        Self {
            cohort,
            num: cdf.len(),
            min: cdf.min(),
            max: cdf.max(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<11} num: {} min: {:.6} max: {:.6}",
            self.cohort.to_string(),
            self.num,
            self.min,
            self.max
        )
    }
}
