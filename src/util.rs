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
//! Utility module collection of functions

use std::{
    env,
    path::{Path, PathBuf},
};

use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::LevelFilter;

/// Logging configuration picked up from the working directory, if present.
pub const LOG_CONFIG: &str = "log4rs.yml";

/// Initialize logging for the sweep. Uses `log4rs.yml` if it exists in the working directory,
/// and a `pretty_env_logger` controlled by `RUST_LOG` (default `info`) otherwise. Either logger
/// is bridged through the returned `MultiProgress`; progress bars must be added to it such that
/// log lines do not tear them apart.
pub fn init_logging() -> MultiProgress {
    let config = Path::new(LOG_CONFIG);
    match config.exists().then(|| file_logger(config)) {
        Some(Ok(logger)) => {
            let level = logger.max_log_level();
            install(logger, level)
        }
        Some(Err(e)) => {
            eprintln!("Cannot initialize logging from {LOG_CONFIG}: {e}");
            init_console_logging()
        }
        None => init_console_logging(),
    }
}

/// Initialize logging to the terminal only, ignoring `log4rs.yml`. Used by programs that are
/// launched by the sweep and therefore must not write to its log files.
pub fn init_console_logging() -> MultiProgress {
    let logger = pretty_env_logger::formatted_builder()
        .parse_filters(&env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .build();
    let level = logger.filter();
    install(logger, level)
}

/// Build the `log4rs` logger described by the configuration file at `path`.
pub fn file_logger(path: &Path) -> anyhow::Result<log4rs::Logger> {
    let config = log4rs::config::load_config_file(path, Default::default())?;
    Ok(log4rs::Logger::new(config))
}

fn install<L: log::Log + 'static>(logger: L, level: LevelFilter) -> MultiProgress {
    let multi = MultiProgress::new();
    if LogWrapper::new(multi.clone(), logger).try_init().is_ok() {
        log::set_max_level(level);
    }
    multi
}

pub trait PathBufExt: Sized {
    fn then(self, p: impl AsRef<Path>) -> PathBuf;
}

impl PathBufExt for PathBuf {
    fn then(mut self, p: impl AsRef<Path>) -> PathBuf {
        self.push(p);
        self
    }
}

impl PathBufExt for &Path {
    fn then(self, p: impl AsRef<Path>) -> PathBuf {
        let mut path = self.to_path_buf();
        path.push(p);
        path
    }
}

/// Directory containing `file`, `.` for bare file names.
pub fn parent_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
