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
//! Runs a parameter sweep of the MCPTT operational modes simulation.
//!
//! Without arguments, all 48 combinations of the `media-sps` sweep are simulated with 12
//! simulations running at a time, and each result directory is analyzed afterwards.

use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;

use mcptt_sweep::{
    simulation::{
        directory_name, run_sweep, Dispatcher, FailurePolicy, Preset, SweepConfig, SystemRunner,
    },
    util,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Built-in sweep to run.
    #[arg(short, long, value_enum, default_value_t = Preset::MediaSps)]
    preset: Preset,
    /// Load the sweep from a JSON file instead of using a built-in one.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overwrite the directory in which the output directories are created.
    #[arg(short, long)]
    output_root: Option<PathBuf>,
    /// Overwrite the number of simulations running at the same time.
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,
    /// Overwrite what happens when the simulator fails.
    #[arg(long, value_enum)]
    on_failure: Option<FailurePolicy>,
    /// Do not build the simulator before the sweep.
    #[arg(long)]
    no_prebuild: bool,
    /// Only print the output directories and commands.
    #[arg(long)]
    dry_run: bool,
    /// Print the configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let multi = util::init_logging();
    let args = Args::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => SweepConfig::from_file(path)
            .with_context(|| format!("Cannot load the sweep from {}", path.display()))?,
        None => SweepConfig::preset(args.preset),
    };
    if let Some(output_root) = args.output_root {
        config.output_root = output_root;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(on_failure) = args.on_failure {
        config.on_failure = on_failure;
    }
    if args.no_prebuild {
        config.simulator.prebuild = false;
    }
    config.validate().context("Invalid sweep configuration")?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.dry_run {
        let dispatcher = Dispatcher::new(&config, &SystemRunner);
        println!("Total number of simulations: {}", config.grid().len());
        for tuple in config.grid().iter() {
            let dir = dispatcher.output_dir(&tuple);
            println!("Output dir: {}", directory_name(&config.dir_prefix, &tuple));
            println!("    {}", dispatcher.simulator_invocation(&tuple, &dir));
        }
        return Ok(());
    }

    let bar = multi.add(ProgressBar::new(config.grid().len() as u64));
    let summary = run_sweep(&config, &SystemRunner, &bar)
        .with_context(|| format!("Cannot run the sweep `{}`", config.name))?;
    multi.remove(&bar);

    for report in summary.failures() {
        println!("{report}");
    }
    println!("{summary}");

    if summary.failed() > 0 {
        process::exit(1);
    }
    Ok(())
}
