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
use std::{
    collections::HashSet,
    fs, io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use indicatif::ProgressBar;
use itertools::Itertools;

use super::count_dirs;
use crate::simulation::*;

/// Pretends to be the simulator: keeps track of how many simulations run at the same time and
/// writes the raw data files into the output directory.
#[derive(Default)]
struct FakeSimulator {
    running: AtomicUsize,
    peak: AtomicUsize,
    simulations: AtomicUsize,
    analyzed: Mutex<Vec<String>>,
}

impl ProcessRunner for FakeSimulator {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutcome> {
        let start = Instant::now();
        if invocation.program == "./ns3" {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));

            let dir = invocation
                .args
                .iter()
                .find_map(|a| a.strip_prefix("--cwd="))
                .unwrap()
                .to_string();
            fs::write(format!("{dir}/{ACCESS_TIME_FILE}"), "# access\n")?;
            fs::write(format!("{dir}/{M2E_LATENCY_FILE}"), "# m2e\n")?;
            fs::write(&invocation.log_path, "simulation done\n")?;

            self.simulations.fetch_add(1, Ordering::SeqCst);
            self.running.fetch_sub(1, Ordering::SeqCst);
        } else {
            let input = invocation.args.last().unwrap().clone();
            assert!(std::path::Path::new(&input).exists());
            self.analyzed.lock().unwrap().push(input);
        }
        Ok(ProcessOutcome {
            exit_code: Some(0),
            duration: start.elapsed(),
            log_path: invocation.log_path.clone(),
        })
    }
}

fn sweep_config(root: &std::path::Path, concurrency: usize) -> SweepConfig {
    let mut config = SweepConfig::preset(Preset::Static);
    config.output_root = root.join("sweep");
    config.concurrency = concurrency;
    config.simulator.prebuild = false;
    config
}

#[test]
fn twelve_runs_with_three_workers() {
    let root = tempfile::tempdir().unwrap();
    let mut config = sweep_config(root.path(), 3);
    config.axes = vec![
        Axis::new("numerology", "slNumerology", "slNum", [0i64, 2]),
        Axis::new("mcs", "slMcs", "mcs", [14i64]),
        Axis::new("sensing", "enableSensing", "sensing", [false, true]),
        Axis::new("rri", "rri", "rri", [0i64]),
        Axis::new("max transmissions", "maxNTx", "maxNTx", [1i64, 4, 8]),
        Axis::new("harq feedback", "harqFeedback", "harqF", [false]),
    ];
    assert_eq!(config.grid().len(), 2 * 2 * 3);

    let simulator = FakeSimulator::default();
    let summary = run_sweep(&config, &simulator, &ProgressBar::hidden()).unwrap();

    assert_eq!(summary.reports.len(), 12);
    assert_eq!(summary.succeeded(), 12);
    assert_eq!(summary.failed(), 0);
    assert_eq!(simulator.simulations.load(Ordering::SeqCst), 12);

    // never more than 3 simulations alive at any instant
    let peak = simulator.peak.load(Ordering::SeqCst);
    assert!((1..=3).contains(&peak), "peak concurrency {peak}");

    // one uniquely named directory per tuple
    assert_eq!(count_dirs(&config.output_root), 12);
    let dirs: HashSet<_> = summary.reports.iter().map(|r| r.directory.clone()).collect();
    assert_eq!(dirs.len(), 12);
    assert!(summary
        .reports
        .iter()
        .all(|r| r.directory.join("output.txt").exists()));

    // both analyses ran on each directory
    let analyzed = simulator.analyzed.into_inner().unwrap();
    assert_eq!(analyzed.len(), 24);
    assert_eq!(analyzed.iter().unique().count(), 24);
    assert_eq!(
        analyzed.iter().filter(|a| a.ends_with(M2E_LATENCY_FILE)).count(),
        12
    );
}

#[test]
fn reports_are_sorted_by_tuple() {
    let root = tempfile::tempdir().unwrap();
    let config = sweep_config(root.path(), 5);
    let summary = run_sweep(&config, &FakeSimulator::default(), &ProgressBar::hidden()).unwrap();
    let expected = config.grid().iter().collect_vec();
    assert_eq!(
        summary.reports.iter().map(|r| r.tuple.clone()).collect_vec(),
        expected
    );
}

#[test]
fn existing_directory_fails_single_run() {
    let root = tempfile::tempdir().unwrap();
    let config = sweep_config(root.path(), 2);
    let simulator = FakeSimulator::default();
    let dispatcher = Dispatcher::new(&config, &simulator);
    let tuple = config.grid().get(4).unwrap();
    fs::create_dir_all(dispatcher.output_dir(&tuple)).unwrap();

    let summary = run_sweep(&config, &simulator, &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.succeeded(), 11);
    let failed = summary.failures().next().unwrap();
    assert_eq!(failed.tuple.index, 4);
    assert_eq!(failed.status(), RunStatus::DispatchFailed);
    assert!(failed.analyses.is_empty());
    assert_eq!(simulator.simulations.load(Ordering::SeqCst), 11);
}

#[cfg(unix)]
#[test]
fn system_runner_with_script_simulator() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempfile::tempdir().unwrap();
    // stand-in for `./ns3 run "<scenario> <flags>" --cwd=<dir>`
    let script = root.path().join("fake-ns3.sh");
    fs::write(
        &script,
        "#!/bin/sh\nif [ \"$#\" -eq 0 ]; then echo built; exit 0; fi\n\
         dir=\"${3#--cwd=}\"\necho \"$2\"\necho '1.0 0 1 1 0.050' > \"$dir/mcptt-m2e-latency.txt\"\n\
         case \"$2\" in *maxNTx=8*) exit 2;; esac\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = sweep_config(root.path(), 2);
    config.simulator.runner = script.display().to_string();
    config.simulator.prebuild = true;
    config.analyses = vec![AnalysisStep {
        name: "count".to_string(),
        program: "wc".to_string(),
        args: vec!["-l".to_string()],
        input_file: M2E_LATENCY_FILE.to_string(),
        log_file: "analysis.txt".to_string(),
    }];

    let summary = run_sweep(&config, &SystemRunner, &ProgressBar::hidden()).unwrap();
    assert_eq!(summary.reports.len(), 12);
    // maxNTx=8 fails in a third of the runs, the analyses still run
    assert_eq!(summary.failed(), 4);
    assert_eq!(summary.succeeded(), 8);
    for report in summary.reports.iter() {
        let log = fs::read_to_string(report.directory.join("output.txt")).unwrap();
        assert!(log.contains("nr-mcptt-operational-modes-static --minNumAccess=1000"));
        assert_eq!(report.analyses.len(), 1);
        assert!(report.analyses[0].success());
        let analysis = fs::read_to_string(report.directory.join("analysis.txt")).unwrap();
        assert!(analysis.trim_start().starts_with('1'));
    }
    let prebuild = fs::read_to_string(config.output_root.join("prebuild.txt")).unwrap();
    assert_eq!(prebuild.trim(), "built");
}
