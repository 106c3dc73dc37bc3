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
//! Library for sweeping sidelink MCPTT simulation parameters and analyzing the resulting
//! mouth-to-ear latency traces.
//!
//! The [`simulation`] module enumerates parameter combinations, runs the external simulator once
//! per combination on a bounded worker pool and triggers the post-run analyses. The [`records`],
//! [`cdf`], [`figure`] and [`report`] modules turn a single latency trace into per-cohort
//! empirical CDFs, a figure and raw text exports.

pub mod cdf;
pub mod figure;
pub mod records;
pub mod report;
pub mod simulation;
pub mod util;

#[cfg(test)]
mod test;

pub mod prelude {
    pub use super::{
        cdf::{Cohort, CohortSamples, EmpiricalCdf},
        records::{LatencyRecord, LatencySchema},
        report::{plot_latency_file, PlotOptions},
        simulation::{
            run_sweep, Axis, AxisValue, FailurePolicy, ParameterGrid, ParameterTuple, Preset,
            SweepConfig, SystemRunner,
        },
    };
}
