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
//! Turns a mouth-to-ear latency trace into per-cohort CDFs, a figure and raw CDF exports.

use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;
use thiserror::Error;

use crate::{
    cdf::{CdfError, Cohort, CohortSamples, EmpiricalCdf, Summary},
    figure::{self, PlotError},
    records::{LatencySchema, RecordError},
    util::{parent_dir, PathBufExt},
};

/// Trace that is plotted when no file is given.
pub const DEFAULT_M2E_FILE: &str = "mcptt-operational-modes-static-m2e-latency.dat";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Records(#[from] RecordError),
    #[error(transparent)]
    Cdf(#[from] CdfError),
    #[error(transparent)]
    Plot(#[from] PlotError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlotOptions {
    /// Skip empty cohorts instead of failing.
    pub allow_empty: bool,
    /// Upper bound of the x-axis in milliseconds.
    pub x_max: f64,
    /// Also export the figure as PDF (requires the `pdf` feature).
    pub pdf: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            allow_empty: false,
            x_max: figure::DEFAULT_X_MAX,
            pdf: cfg!(feature = "pdf"),
        }
    }
}

/// Paths of all files produced for the trace `input`. They are placed next to the input, named
/// after its file stem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportPaths {
    dir: PathBuf,
    stem: String,
}

impl ReportPaths {
    pub fn new(input: &Path) -> Self {
        Self {
            dir: parent_dir(input),
            stem: input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn html(&self) -> PathBuf {
        self.dir.as_path().then(format!("{}-cdf.html", self.stem))
    }

    pub fn pdf(&self) -> PathBuf {
        self.dir.as_path().then(format!("{}-cdf.pdf", self.stem))
    }

    pub fn raw(&self, cohort: Cohort) -> PathBuf {
        self.dir
            .as_path()
            .then(format!("{}-cdf_{}.txt", self.stem, cohort.file_suffix()))
    }
}

/// Load the trace, print a summary per cohort, write the figure and the raw CDF of each cohort.
/// Returns the CDFs that were plotted.
///
/// Fails with [`CdfError::EmptyCohort`] before writing anything if any cohort is empty, unless
/// `options.allow_empty` is set.
pub fn plot_latency_file(
    input: impl AsRef<Path>,
    schema: &LatencySchema,
    options: &PlotOptions,
) -> Result<Vec<(Cohort, EmpiricalCdf)>, ReportError> {
    let input = input.as_ref();
    let samples = CohortSamples::from_records(schema.load(input)?);

    let mut cdfs = Vec::new();
    for cohort in Cohort::iter() {
        match samples.cdf(cohort) {
            Ok(cdf) => {
                println!("{}", Summary::new(cohort, &cdf));
                cdfs.push((cohort, cdf));
            }
            Err(CdfError::EmptyCohort(c)) if options.allow_empty => {
                log::warn!("Skipping the {c} cohort of {}, as it has no samples", input.display())
            }
            Err(e) => return Err(e.into()),
        }
    }

    let paths = ReportPaths::new(input);
    let plot = figure::cdf_figure(cdfs.iter().map(|(c, cdf)| (*c, cdf)), options.x_max);
    figure::write_html(&plot, &paths.html())?;
    if options.pdf {
        #[cfg(feature = "pdf")]
        figure::write_pdf(&plot, &paths.pdf())?;
        #[cfg(not(feature = "pdf"))]
        log::warn!(
            "Not writing {}, compiled without the `pdf` feature",
            paths.pdf().display()
        );
    }

    for (cohort, cdf) in cdfs.iter() {
        cdf.write(paths.raw(*cohort))?;
    }

    Ok(cdfs)
}
