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
//! Sweep configuration and the built-in presets.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    dispatcher::directory_name,
    grid::{Axis, AxisValue, ParameterGrid},
};

/// Scenario name of the MCPTT operational modes simulation.
pub const DEFAULT_SCENARIO: &str = "nr-mcptt-operational-modes-static";
/// Raw access-time trace written by the simulator into each output directory.
pub const ACCESS_TIME_FILE: &str = "mcptt-access-time.txt";
/// Raw mouth-to-ear latency trace written by the simulator into each output directory.
pub const M2E_LATENCY_FILE: &str = "mcptt-m2e-latency.txt";

/// Error thrown when a sweep configuration cannot be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot parse the sweep configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("The sweep does not define any axis.")]
    NoAxes,
    #[error("Axis `{0}` has no values.")]
    EmptyAxis(String),
    #[error("Axis {field} `{value}` is used more than once.")]
    DuplicateAxis { field: &'static str, value: String },
    #[error("Value `{value}` of axis `{axis}` must not contain whitespace or path separators.")]
    InvalidValue { axis: String, value: String },
    #[error("Tuples #{first} and #{second} would both write to `{name}`.")]
    DirectoryCollision {
        name: String,
        first: usize,
        second: usize,
    },
    #[error("The worker pool needs at least one worker.")]
    ZeroConcurrency,
}

/// What to do when the simulator exits with a non-zero exit code.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure and run the analyses anyway.
    #[default]
    Ignore,
    /// Skip the analyses of the failed run.
    SkipAnalysis,
    /// Skip the analyses of the failed run and do not start any further run.
    Abort,
}

/// Built-in parameter sweeps.
#[derive(
    ValueEnum,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Preset {
    /// Operational modes including the media SPS flags of the off-network and relay calls.
    #[default]
    MediaSps,
    /// Operational modes without the media SPS flags.
    Static,
}

/// Invocation of the external simulator.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// Program that runs the simulator, e.g., `./ns3`.
    pub runner: String,
    /// Name of the simulation scenario.
    pub scenario: String,
    /// Flags passed to every run, as `(flag, value)` pairs.
    #[serde(default)]
    pub fixed_flags: Vec<(String, String)>,
    /// Log file (inside the output directory) receiving stdout and stderr of the simulator.
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Call the runner once without arguments before the sweep (which builds the simulator).
    #[serde(default)]
    pub prebuild: bool,
}

/// Program that is run on a raw data file after each simulation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisStep {
    pub name: String,
    pub program: String,
    /// Arguments placed before the path of the input file.
    #[serde(default)]
    pub args: Vec<String>,
    /// Raw data file inside the output directory.
    pub input_file: String,
    /// Log file inside the output directory.
    #[serde(default = "default_analysis_log_file")]
    pub log_file: String,
}

/// Complete description of a parameter sweep.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SweepConfig {
    pub name: String,
    pub axes: Vec<Axis>,
    /// Maximum number of simulations running at the same time.
    pub concurrency: usize,
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub analyses: Vec<AnalysisStep>,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_dir_prefix")]
    pub dir_prefix: String,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Allow writing into output directories that already exist.
    #[serde(default)]
    pub allow_existing: bool,
}

fn default_log_file() -> String {
    "output.txt".to_string()
}

fn default_analysis_log_file() -> String {
    "analysis.txt".to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_dir_prefix() -> String {
    "output".to_string()
}

impl SweepConfig {
    /// Build one of the built-in sweeps.
    pub fn preset(preset: Preset) -> Self {
        let mut axes = vec![
            Axis::new("numerology", "slNumerology", "slNum", [0i64, 2]),
            Axis::new("mcs", "slMcs", "mcs", [14i64]),
            Axis::new("sensing", "enableSensing", "sensing", [false, true]),
            Axis::new("resource reservation interval", "rri", "rri", [0i64]),
            Axis::new("max transmissions", "maxNTx", "maxNTx", [1i64, 4, 8]),
            Axis::new("harq feedback", "harqFeedback", "harqF", [false]),
        ];
        let concurrency = match preset {
            Preset::MediaSps => {
                axes.push(Axis::new(
                    "off-network media sps",
                    "offNetMediaSps",
                    "offNetMediaSps",
                    [false, true],
                ));
                axes.push(Axis::new(
                    "relay media sps",
                    "relayMediaSps",
                    "relayMediaSps",
                    [true, false],
                ));
                12
            }
            Preset::Static => 6,
        };

        Self {
            name: preset.to_string(),
            axes,
            concurrency,
            simulator: SimulatorConfig {
                runner: "./ns3".to_string(),
                scenario: DEFAULT_SCENARIO.to_string(),
                fixed_flags: [("minNumAccess", "1000"), ("RngRun", "2"), ("showProgress", "true")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                log_file: default_log_file(),
                prebuild: true,
            },
            analyses: vec![
                AnalysisStep {
                    name: "access-time".to_string(),
                    program: "python3".to_string(),
                    args: vec!["mcptt-operational-modes-plot-access-time.py".to_string()],
                    input_file: ACCESS_TIME_FILE.to_string(),
                    log_file: default_analysis_log_file(),
                },
                AnalysisStep {
                    name: "m2e-latency".to_string(),
                    program: "plot_cdf".to_string(),
                    args: Vec::new(),
                    input_file: M2E_LATENCY_FILE.to_string(),
                    log_file: default_analysis_log_file(),
                },
            ],
            output_root: default_output_root(),
            dir_prefix: default_dir_prefix(),
            on_failure: FailurePolicy::default(),
            allow_existing: false,
        }
    }

    /// Load a sweep from a JSON file. The result is validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(&fs::read_to_string(path.as_ref())?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn grid(&self) -> ParameterGrid<'_> {
        ParameterGrid::new(&self.axes)
    }

    /// Check that the sweep is well-formed, and that every tuple maps to its own output
    /// directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.axes.is_empty() {
            return Err(ConfigError::NoAxes);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        let mut names = HashSet::new();
        let mut flags = HashSet::new();
        let mut tokens = HashSet::new();
        for axis in self.axes.iter() {
            if axis.values.is_empty() {
                return Err(ConfigError::EmptyAxis(axis.name.clone()));
            }
            for (field, value, seen) in [
                ("name", &axis.name, &mut names),
                ("flag", &axis.flag, &mut flags),
                ("token", &axis.token, &mut tokens),
            ] {
                if !seen.insert(value.clone()) {
                    return Err(ConfigError::DuplicateAxis {
                        field,
                        value: value.clone(),
                    });
                }
            }
            if let Some(value) = axis.values.iter().find(|v| match v {
                AxisValue::Text(s) => s.is_empty() || s.contains(|c: char| is_forbidden(c)),
                _ => false,
            }) {
                return Err(ConfigError::InvalidValue {
                    axis: axis.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        let mut seen_dirs = std::collections::HashMap::new();
        for tuple in self.grid().iter() {
            let name = directory_name(&self.dir_prefix, &tuple);
            if let Some(first) = seen_dirs.insert(name.clone(), tuple.index) {
                return Err(ConfigError::DirectoryCollision {
                    name,
                    first,
                    second: tuple.index,
                });
            }
        }

        Ok(())
    }
}

fn is_forbidden(c: char) -> bool {
    c.is_whitespace() || c == '/' || c == '\\'
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_presets() {
        let media = SweepConfig::preset(Preset::MediaSps);
        assert_eq!(media.axes.len(), 8);
        assert_eq!(media.grid().len(), 48);
        assert_eq!(media.concurrency, 12);
        assert_eq!(media.name, "media-sps");

        let fixed = SweepConfig::preset(Preset::Static);
        assert_eq!(fixed.axes.len(), 6);
        assert_eq!(fixed.grid().len(), 12);
        assert_eq!(fixed.concurrency, 6);

        for preset in Preset::iter() {
            SweepConfig::preset(preset).validate().unwrap();
        }
    }

    #[test]
    fn test_preset_directories_unique() {
        for preset in Preset::iter() {
            let config = SweepConfig::preset(preset);
            let names: HashSet<String> = config
                .grid()
                .iter()
                .map(|t| directory_name(&config.dir_prefix, &t))
                .collect();
            assert_eq!(names.len(), config.grid().len());
        }
    }

    #[test]
    fn test_validate() {
        let mut config = SweepConfig::preset(Preset::Static);
        config.concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroConcurrency)));

        let mut config = SweepConfig::preset(Preset::Static);
        config.axes[1].values.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyAxis(name)) if name == "mcs"));

        let mut config = SweepConfig::preset(Preset::Static);
        config.axes[2].token = "slNum".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAxis { field: "token", .. })
        ));

        let mut config = SweepConfig::preset(Preset::Static);
        config.axes[0].values.push(AxisValue::from("a b"));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = SweepConfig::preset(Preset::Static);
        config.axes.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoAxes)));
    }

    #[test]
    fn test_directory_collision() {
        let mut config = SweepConfig::preset(Preset::Static);
        // `1` and `"1"` print the same
        config.axes[1].values = vec![AxisValue::Int(1), AxisValue::from("1")];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DirectoryCollision { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        fs::write(
            &path,
            r#"{
                "name": "small",
                "axes": [
                    {"name": "numerology", "flag": "slNumerology", "token": "slNum", "values": [0, 1]},
                    {"name": "sensing", "flag": "enableSensing", "token": "sensing", "values": [true]}
                ],
                "concurrency": 2,
                "simulator": {"runner": "./ns3", "scenario": "nr-prose-relay"},
                "on_failure": "skip-analysis"
            }"#,
        )
        .unwrap();

        let config = SweepConfig::from_file(&path).unwrap();
        assert_eq!(config.grid().len(), 2);
        assert_eq!(config.simulator.log_file, "output.txt");
        assert!(!config.simulator.prebuild);
        assert!(config.analyses.is_empty());
        assert_eq!(config.output_root, PathBuf::from("."));
        assert_eq!(config.dir_prefix, "output");
        assert_eq!(config.on_failure, FailurePolicy::SkipAnalysis);

        fs::write(&path, r#"{"name": "broken"}"#).unwrap();
        assert!(matches!(
            SweepConfig::from_file(&path),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_roundtrip_preset_json() {
        let config = SweepConfig::preset(Preset::MediaSps);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SweepConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
