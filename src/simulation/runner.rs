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
//! Module that executes the simulator for all tuples of a sweep on a bounded worker pool and
//! collects a report for each of them.

use std::{
    fmt, fs, io,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
};

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::prelude::*;
use thiserror::Error;

use super::{
    analysis::{run_analyses, AnalysisOutcome},
    config::{ConfigError, FailurePolicy, SweepConfig},
    dispatcher::{DispatchError, Dispatcher},
    grid::ParameterTuple,
    process::{ProcessOutcome, ProcessRunner},
};

/// Error that prevents the sweep from starting.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot create the output root {path:?}: {source}")]
    OutputRoot { path: PathBuf, source: io::Error },
    #[error("Cannot build the simulator: {0}")]
    PrebuildLaunch(io::Error),
    #[error("Building the simulator failed ({0}), see {1:?}")]
    Prebuild(ProcessOutcome, PathBuf),
    #[error("Cannot create the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Final state of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum RunStatus {
    Succeeded,
    /// The output directory could not be created, or the simulator could not be launched.
    DispatchFailed,
    /// The simulator exited with a non-zero exit code.
    SimulatorFailed,
    /// At least one analysis failed.
    AnalysisFailed,
    /// The run was never started, because the sweep was aborted.
    Skipped,
}

impl RunStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::DispatchFailed | Self::SimulatorFailed | Self::AnalysisFailed
        )
    }
}

/// Report of a single tuple.
#[derive(Debug)]
pub struct RunReport {
    pub tuple: ParameterTuple,
    pub directory: PathBuf,
    /// `None` if the run was skipped.
    pub simulator: Option<Result<ProcessOutcome, DispatchError>>,
    pub analyses: Vec<AnalysisOutcome>,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        match &self.simulator {
            None => RunStatus::Skipped,
            Some(Err(_)) => RunStatus::DispatchFailed,
            Some(Ok(outcome)) if !outcome.success() => RunStatus::SimulatorFailed,
            Some(Ok(_)) if self.analyses.iter().any(|a| !a.success()) => {
                RunStatus::AnalysisFailed
            }
            Some(Ok(_)) => RunStatus::Succeeded,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>15} {}", self.status().to_string(), self.directory.display())?;
        match &self.simulator {
            Some(Ok(outcome)) => write!(f, ": simulator {outcome}")?,
            Some(Err(e)) => write!(f, ": {e}")?,
            None => {}
        }
        for analysis in self.analyses.iter().filter(|a| !a.success()) {
            match &analysis.result {
                Ok(outcome) => write!(f, ", {} {outcome}", analysis.name)?,
                Err(e) => write!(f, ", {}: {e}", analysis.name)?,
            }
        }
        Ok(())
    }
}

/// Reports of all tuples of a sweep, ordered by tuple index.
#[derive(Debug, Default)]
pub struct SweepSummary {
    pub reports: Vec<RunReport>,
}

impl SweepSummary {
    fn count(&self, f: impl Fn(RunStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| f(r.status())).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| s == RunStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| s.is_failure())
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| s == RunStatus::Skipped)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunReport> {
        self.reports.iter().filter(|r| r.status().is_failure())
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} simulations: {} succeeded, {} failed, {} skipped",
            self.reports.len(),
            self.succeeded(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Run the simulator and all analyses for a single tuple.
pub fn run_tuple<R: ProcessRunner + ?Sized>(
    dispatcher: &Dispatcher<'_, R>,
    tuple: ParameterTuple,
) -> RunReport {
    let config = dispatcher.config();
    let directory = dispatcher.output_dir(&tuple);
    let simulator = dispatcher.dispatch(&tuple);

    let analyses = match &simulator {
        Err(e) => {
            log::error!("[{}] {e}", directory.display());
            Vec::new()
        }
        Ok(outcome) if !outcome.success() => {
            log::warn!(
                "[{}] simulator failed with {outcome}, see {:?}",
                directory.display(),
                outcome.log_path
            );
            match config.on_failure {
                FailurePolicy::Ignore => {
                    run_analyses(&config.analyses, &directory, dispatcher.runner())
                }
                FailurePolicy::SkipAnalysis | FailurePolicy::Abort => Vec::new(),
            }
        }
        Ok(outcome) => {
            log::info!(
                "[{}] simulator finished after {:.2?}",
                directory.display(),
                outcome.duration
            );
            run_analyses(&config.analyses, &directory, dispatcher.runner())
        }
    };

    RunReport {
        tuple,
        directory,
        simulator: Some(simulator),
        analyses,
    }
}

/// Execute the whole sweep.
///
/// At most `config.concurrency` tuples are processed at the same time, each by a worker that runs
/// the simulator and then the analyses to completion before picking up the next tuple. Reports
/// are drained in completion order, and the function only returns once every tuple has finished.
pub fn run_sweep<R: ProcessRunner + ?Sized>(
    config: &SweepConfig,
    runner: &R,
    bar: &ProgressBar,
) -> Result<SweepSummary, SweepError> {
    config.validate()?;
    fs::create_dir_all(&config.output_root).map_err(|source| SweepError::OutputRoot {
        path: config.output_root.clone(),
        source,
    })?;

    let dispatcher = Dispatcher::new(config, runner);

    if config.simulator.prebuild {
        let invocation = dispatcher.prebuild_invocation();
        log::info!("Building the simulator: {invocation}");
        let outcome = runner
            .run(&invocation)
            .map_err(SweepError::PrebuildLaunch)?;
        if !outcome.success() {
            return Err(SweepError::Prebuild(outcome, invocation.log_path));
        }
    }

    let tuples = config.grid().iter().collect_vec();
    let num_tuples = tuples.len();
    log::info!(
        "Total number of simulations: {num_tuples} ({} at a time)",
        config.concurrency
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency)
        .thread_name(|i| format!("sweep-worker-{i}"))
        .build()?;

    bar.set_length(num_tuples as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "[{bar:60}] {pos:>4}/{len:4}, elapsed: {elapsed}, eta: {eta} {msg}",
    ) {
        bar.set_style(style.progress_chars("##-"));
    }

    let aborted = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<RunReport>();
    let mut reports = Vec::with_capacity(num_tuples);

    thread::scope(|s| {
        let dispatcher = &dispatcher;
        let aborted = &aborted;
        s.spawn(move || {
            pool.install(|| {
                tuples.into_par_iter().for_each_with(tx, |tx, tuple| {
                    let report = if aborted.load(Ordering::SeqCst) {
                        RunReport {
                            directory: dispatcher.output_dir(&tuple),
                            tuple,
                            simulator: None,
                            analyses: Vec::new(),
                        }
                    } else {
                        run_tuple(dispatcher, tuple)
                    };
                    if config.on_failure == FailurePolicy::Abort
                        && matches!(
                            report.status(),
                            RunStatus::DispatchFailed | RunStatus::SimulatorFailed
                        )
                        && !aborted.swap(true, Ordering::SeqCst)
                    {
                        log::error!("Aborting the sweep after the failure of {}", report.tuple);
                    }
                    // the receiver is alive until every sender is dropped
                    let _ = tx.send(report);
                })
            })
        });

        let mut failed = 0;
        for report in rx {
            bar.inc(1);
            if report.status().is_failure() {
                failed += 1;
                bar.set_message(format!("({failed} failed)"));
            }
            reports.push(report);
        }
    });
    bar.finish();

    reports.sort_by_key(|r| r.tuple.index);
    let summary = SweepSummary { reports };
    log::info!("{summary}");
    Ok(summary)
}

#[cfg(test)]
mod test {
    use std::{collections::HashSet, io, sync::Mutex, time::Duration};

    use super::*;
    use crate::simulation::{AxisValue, Invocation, Preset, SweepConfig};

    /// Fails every simulator invocation.
    struct Failing {
        calls: Mutex<Vec<Invocation>>,
    }

    impl ProcessRunner for Failing {
        fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutcome> {
            self.calls.lock().unwrap().push(invocation.clone());
            Ok(ProcessOutcome {
                exit_code: Some(if invocation.program == "./ns3" { 1 } else { 0 }),
                duration: Duration::ZERO,
                log_path: invocation.log_path.clone(),
            })
        }
    }

    fn config(root: &std::path::Path, concurrency: usize, policy: FailurePolicy) -> SweepConfig {
        let mut config = SweepConfig::preset(Preset::Static);
        config.output_root = root.to_path_buf();
        config.simulator.prebuild = false;
        config.concurrency = concurrency;
        config.on_failure = policy;
        config
    }

    fn run(config: &SweepConfig) -> (SweepSummary, Vec<Invocation>) {
        let runner = Failing {
            calls: Mutex::new(Vec::new()),
        };
        let summary = run_sweep(config, &runner, &ProgressBar::hidden()).unwrap();
        (summary, runner.calls.into_inner().unwrap())
    }

    #[test]
    fn test_ignore() {
        let root = tempfile::tempdir().unwrap();
        let (summary, calls) = run(&config(root.path(), 4, FailurePolicy::Ignore));
        assert_eq!(summary.reports.len(), 12);
        assert_eq!(summary.failed(), 12);
        assert!(summary
            .reports
            .iter()
            .all(|r| r.status() == RunStatus::SimulatorFailed && r.analyses.len() == 2));
        // one simulator call and two analyses per tuple
        assert_eq!(calls.len(), 36);
    }

    #[test]
    fn test_skip_analysis() {
        let root = tempfile::tempdir().unwrap();
        let (summary, calls) = run(&config(root.path(), 4, FailurePolicy::SkipAnalysis));
        assert_eq!(summary.failed(), 12);
        assert!(summary.reports.iter().all(|r| r.analyses.is_empty()));
        assert_eq!(calls.len(), 12);
        assert!(calls.iter().all(|c| c.program == "./ns3"));
    }

    #[test]
    fn test_abort() {
        let root = tempfile::tempdir().unwrap();
        let (summary, calls) = run(&config(root.path(), 1, FailurePolicy::Abort));
        assert_eq!(summary.reports.len(), 12);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.skipped(), 11);
        assert_eq!(summary.succeeded(), 0);
        assert_eq!(calls.len(), 1);
        assert!(summary
            .reports
            .iter()
            .enumerate()
            .all(|(i, r)| r.tuple.index == i));
    }

    #[test]
    fn test_prebuild_failure() {
        let root = tempfile::tempdir().unwrap();
        let mut config = config(root.path(), 2, FailurePolicy::Ignore);
        config.simulator.prebuild = true;
        let runner = Failing {
            calls: Mutex::new(Vec::new()),
        };
        assert!(matches!(
            run_sweep(&config, &runner, &ProgressBar::hidden()),
            Err(SweepError::Prebuild(..))
        ));
        let calls = runner.calls.into_inner().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].args.is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let root = tempfile::tempdir().unwrap();
        let mut config = config(root.path(), 2, FailurePolicy::Ignore);
        config.axes[0].values.push(AxisValue::Int(0));
        let runner = Failing {
            calls: Mutex::new(Vec::new()),
        };
        assert!(matches!(
            run_sweep(&config, &runner, &ProgressBar::hidden()),
            Err(SweepError::Config(ConfigError::DirectoryCollision { .. }))
        ));
        assert!(runner.calls.into_inner().unwrap().is_empty());
    }

    #[test]
    fn test_report_display() {
        let root = tempfile::tempdir().unwrap();
        let (summary, _) = run(&config(root.path(), 2, FailurePolicy::SkipAnalysis));
        assert_eq!(
            summary.to_string(),
            "12 simulations: 0 succeeded, 12 failed, 0 skipped"
        );
        let line = summary.failures().next().unwrap().to_string();
        assert!(line.contains("SimulatorFailed"));
        assert!(line.contains("exit code 1"));
        let dirs: HashSet<_> = summary.reports.iter().map(|r| r.directory.clone()).collect();
        assert_eq!(dirs.len(), 12);
    }
}
