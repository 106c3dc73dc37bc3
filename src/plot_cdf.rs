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
//! Plots the CDF of the mouth-to-ear latency of the on-network, off-network and relayed calls.
//!
//! All outputs are placed next to the input file, named after its stem `<name>`:
//!
//! - `<name>-cdf.html`: the figure, always written.
//! - `<name>-cdf.pdf`: the same figure as PDF. Only written by builds with the `pdf` cargo feature
//!   (`cargo build --features pdf`), which renders through plotly's kaleido backend and downloads
//!   it at build time. Default builds write the HTML figure only.
//! - `<name>-cdf_<cohort>.txt`: the raw CDF of each cohort (`onNet`, `offNet`, `relay`).
//!
//! Logging goes to the terminal only, as this program runs as an analysis step of the sweep.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use mcptt_sweep::{
    figure::DEFAULT_X_MAX,
    records::LatencySchema,
    report::{plot_latency_file, PlotOptions, DEFAULT_M2E_FILE},
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Mouth-to-ear latency trace written by the simulator.
    #[arg(default_value = DEFAULT_M2E_FILE)]
    file: PathBuf,
    /// Skip cohorts without samples instead of failing.
    #[arg(long)]
    allow_empty: bool,
    /// Upper bound of the x-axis in milliseconds.
    #[arg(long, default_value_t = DEFAULT_X_MAX)]
    x_max: f64,
    /// Do not export the figure as PDF.
    #[arg(long)]
    html_only: bool,
}

fn main() -> anyhow::Result<()> {
    util::init_console_logging();
    let args = Args::parse();

    let options = PlotOptions {
        allow_empty: args.allow_empty,
        x_max: args.x_max,
        pdf: cfg!(feature = "pdf") && !args.html_only,
    };
    plot_latency_file(&args.file, &LatencySchema::default(), &options)
        .with_context(|| format!("Cannot plot {}", args.file.display()))?;

    Ok(())
}
