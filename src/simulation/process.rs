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
//! Abstraction over the execution of external programs (the simulator and the analysis scripts).

use std::{
    env,
    ffi::OsString,
    fmt, fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::{Duration, Instant},
};

use itertools::Itertools;

/// Program call whose stdout and stderr are appended to `log_path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub log_path: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            log_path: log_path.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

}

impl fmt::Display for Invocation {
    /// Formats the invocation like a shell command line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = |s: &String| {
            if s.is_empty() || s.contains(char::is_whitespace) {
                format!("\"{s}\"")
            } else {
                s.clone()
            }
        };
        write!(
            f,
            "{} > {} 2>&1",
            std::iter::once(&self.program)
                .chain(self.args.iter())
                .map(quote)
                .join(" "),
            self.log_path.display()
        )
    }
}

/// Result of a finished program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code of the program, `None` if it was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "exit code {code} after {:.2?}", self.duration),
            None => write!(f, "terminated by a signal after {:.2?}", self.duration),
        }
    }
}

/// Runs an [`Invocation`] to completion. Implementations are shared between the workers of the
/// pool.
pub trait ProcessRunner: Sync {
    /// Block until the program exits. Only a failure to launch the program is an error; the exit
    /// code is reported in the [`ProcessOutcome`].
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutcome>;
}

/// Runs programs as child processes of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutcome> {
        let log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&invocation.log_path)?;
        let program = resolve_program(
            &invocation.program,
            env::var_os("PATH"),
            env::current_exe().ok().as_deref().and_then(Path::parent),
        );
        let mut command = Command::new(program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log));

        log::trace!("spawning {invocation}");
        let start = Instant::now();
        let status = command.status()?;
        Ok(ProcessOutcome {
            exit_code: status.code(),
            duration: start.elapsed(),
            log_path: invocation.log_path.clone(),
        })
    }
}

/// Program to launch for `program`. A bare name that is not found on `search_path` is looked up
/// in `exe_dir`, the directory of the running executable, such that the binaries of this crate
/// are found without installing them. Paths and unknown names are returned unchanged.
pub fn resolve_program(
    program: &str,
    search_path: Option<OsString>,
    exe_dir: Option<&Path>,
) -> PathBuf {
    let name = Path::new(program);
    if name.components().count() != 1 {
        return name.to_path_buf();
    }
    let on_path = search_path
        .as_ref()
        .is_some_and(|paths| env::split_paths(paths).any(|dir| is_executable(&dir, program)));
    if on_path {
        return name.to_path_buf();
    }
    match exe_dir {
        Some(dir) if is_executable(dir, program) => {
            dir.join(format!("{program}{}", env::consts::EXE_SUFFIX))
        }
        _ => name.to_path_buf(),
    }
}

fn is_executable(dir: &Path, program: &str) -> bool {
    dir.join(format!("{program}{}", env::consts::EXE_SUFFIX)).is_file()
}
