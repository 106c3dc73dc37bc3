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
//! Module facilitating to run parameter sweeps of the external network simulator.
//!
//! A sweep is described by a [`SweepConfig`]: the configuration axes spanning the
//! [`ParameterGrid`], the simulator command, and the analyses to run on each result directory.
//! [`run_sweep`] executes one simulator run per [`ParameterTuple`] on a bounded worker pool.

pub mod analysis;
pub mod config;
pub mod dispatcher;
pub mod grid;
pub mod process;
pub mod runner;

pub use analysis::*;
pub use config::*;
pub use dispatcher::*;
pub use grid::*;
pub use process::*;
pub use runner::*;
