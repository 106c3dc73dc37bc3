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
//! Runs the external simulator for a single parameter tuple in its own output directory.

use std::{
    fs, io,
    iter::once,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use thiserror::Error;

use super::{
    config::SweepConfig,
    grid::ParameterTuple,
    process::{Invocation, ProcessOutcome, ProcessRunner},
};
use crate::util::PathBufExt;

/// Error thrown when a run could not be started.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Cannot create the output directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Cannot launch `{program}`: {source}")]
    Launch { program: String, source: io::Error },
}

/// Derive the name of the output directory of a tuple, e.g.,
/// `output_slNum-0_mcs-14_sensing-false_rri-0_maxNTx-1_harqF-false`.
pub fn directory_name(prefix: &str, tuple: &ParameterTuple) -> String {
    once(prefix.to_string())
        .chain(
            tuple
                .bindings
                .iter()
                .map(|b| format!("{}-{}", b.token, b.value)),
        )
        .join("_")
}

/// Creates output directories and runs the simulator in them.
pub struct Dispatcher<'a, R: ?Sized> {
    config: &'a SweepConfig,
    runner: &'a R,
}

impl<'a, R: ProcessRunner + ?Sized> Dispatcher<'a, R> {
    pub fn new(config: &'a SweepConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &'a SweepConfig {
        self.config
    }

    pub fn runner(&self) -> &'a R {
        self.runner
    }

    pub fn output_dir(&self, tuple: &ParameterTuple) -> PathBuf {
        self.config
            .output_root
            .as_path()
            .then(directory_name(&self.config.dir_prefix, tuple))
    }

    /// Command that runs the simulator for `tuple`, writing its results into `dir`. The scenario
    /// and all its flags are passed to the runner as a single argument:
    ///
    /// ```text
    /// ./ns3 run "<scenario> --<fixed flags> --<tuple flags>" --cwd=<dir>
    /// ```
    pub fn simulator_invocation(&self, tuple: &ParameterTuple, dir: &Path) -> Invocation {
        let sim = &self.config.simulator;
        let scenario = once(sim.scenario.clone())
            .chain(sim.fixed_flags.iter().map(|(k, v)| format!("--{k}={v}")))
            .chain(tuple.flags())
            .join(" ");
        Invocation::new(&sim.runner, dir.then(&sim.log_file))
            .arg("run")
            .arg(scenario)
            .arg(format!("--cwd={}", dir.display()))
    }

    /// Command that builds the simulator before the sweep starts.
    pub fn prebuild_invocation(&self) -> Invocation {
        Invocation::new(
            &self.config.simulator.runner,
            self.config.output_root.as_path().then("prebuild.txt"),
        )
    }

    /// Create the output directory of `tuple`. Fails if it already exists, unless the
    /// configuration allows reusing directories.
    pub fn prepare(&self, tuple: &ParameterTuple) -> Result<PathBuf, DispatchError> {
        let path = self.output_dir(tuple);
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e)
                if e.kind() == io::ErrorKind::AlreadyExists
                    && self.config.allow_existing
                    && path.is_dir() =>
            {
                log::debug!("Reusing output directory {path:?}");
            }
            Err(source) => return Err(DispatchError::CreateDir { path, source }),
        }
        log::debug!("Output dir: {}", path.display());
        Ok(path)
    }

    /// Create the output directory and run the simulator to completion. The exit code is
    /// reported, but not interpreted.
    pub fn dispatch(&self, tuple: &ParameterTuple) -> Result<ProcessOutcome, DispatchError> {
        let dir = self.prepare(tuple)?;
        let invocation = self.simulator_invocation(tuple, &dir);
        log::debug!("{invocation}");
        self.runner
            .run(&invocation)
            .map_err(|source| DispatchError::Launch {
                program: invocation.program.clone(),
                source,
            })
    }
}
