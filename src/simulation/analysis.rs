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
//! Post-run analyses executed on the raw data files of a finished simulation.

use std::path::Path;

use super::{
    config::AnalysisStep,
    dispatcher::DispatchError,
    process::{Invocation, ProcessOutcome, ProcessRunner},
};
use crate::util::PathBufExt;

/// Result of a single analysis program.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub name: String,
    pub result: Result<ProcessOutcome, DispatchError>,
}

impl AnalysisOutcome {
    pub fn success(&self) -> bool {
        self.result.as_ref().is_ok_and(|o| o.success())
    }
}

/// Command running `step` on its input file inside `dir`.
pub fn analysis_invocation(step: &AnalysisStep, dir: &Path) -> Invocation {
    Invocation::new(&step.program, dir.then(&step.log_file))
        .args(step.args.iter().cloned())
        .arg(dir.then(&step.input_file).display().to_string())
}

/// Run all analyses one after the other. A failing analysis does not prevent the next ones.
pub fn run_analyses<R: ProcessRunner + ?Sized>(
    steps: &[AnalysisStep],
    dir: &Path,
    runner: &R,
) -> Vec<AnalysisOutcome> {
    steps
        .iter()
        .map(|step| {
            let invocation = analysis_invocation(step, dir);
            log::debug!("{invocation}");
            let result = runner
                .run(&invocation)
                .map_err(|source| DispatchError::Launch {
                    program: invocation.program.clone(),
                    source,
                });
            match &result {
                Ok(outcome) if !outcome.success() => {
                    log::warn!("[{}] analysis {} failed: {outcome}", dir.display(), step.name)
                }
                Err(e) => log::warn!("[{}] analysis {}: {e}", dir.display(), step.name),
                Ok(_) => {}
            }
            AnalysisOutcome {
                name: step.name.clone(),
                result,
            }
        })
        .collect()
}
