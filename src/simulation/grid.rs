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
//! The parameter grid spanned by independent configuration axes.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A single value of a configuration axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AxisValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Bool(b) => write!(f, "{b}"),
            AxisValue::Int(i) => write!(f, "{i}"),
            AxisValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for AxisValue {
    fn from(value: bool) -> Self {
        AxisValue::Bool(value)
    }
}

impl From<i64> for AxisValue {
    fn from(value: i64) -> Self {
        AxisValue::Int(value)
    }
}

impl From<&str> for AxisValue {
    fn from(value: &str) -> Self {
        AxisValue::Text(value.to_string())
    }
}

/// One configuration axis of the simulator, i.e., a named flag together with the ordered list of
/// values to sweep over.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Axis {
    /// Human-readable name of the axis.
    pub name: String,
    /// Flag of the simulator scenario, without the leading `--`.
    pub flag: String,
    /// Short token used to derive output directory names.
    pub token: String,
    /// Values to sweep over, in order.
    pub values: Vec<AxisValue>,
}

impl Axis {
    pub fn new<V: Into<AxisValue>>(
        name: impl Into<String>,
        flag: impl Into<String>,
        token: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            flag: flag.into(),
            token: token.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A value bound to the flag of its axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Binding {
    pub flag: String,
    pub token: String,
    pub value: AxisValue,
}

/// One point of the [`ParameterGrid`]. Its identity is the position `index` within the grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterTuple {
    pub index: usize,
    pub bindings: Vec<Binding>,
}

impl ParameterTuple {
    /// Get the value bound to `flag`.
    pub fn get(&self, flag: &str) -> Option<&AxisValue> {
        self.bindings
            .iter()
            .find(|b| b.flag == flag)
            .map(|b| &b.value)
    }

    /// Command-line flags of the form `--flag=value`, in axis order.
    pub fn flags(&self) -> impl Iterator<Item = String> + '_ {
        self.bindings
            .iter()
            .map(|b| format!("--{}={}", b.flag, b.value))
    }
}

impl fmt::Display for ParameterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} ({})",
            self.index,
            self.bindings
                .iter()
                .map(|b| format!("{}={}", b.flag, b.value))
                .join(", ")
        )
    }
}

/// Cartesian product of a list of axes. The first axis varies slowest and the last axis fastest.
/// No filtering or deduplication is applied.
#[derive(Clone, Copy, Debug)]
pub struct ParameterGrid<'a> {
    axes: &'a [Axis],
}

impl<'a> ParameterGrid<'a> {
    pub fn new(axes: &'a [Axis]) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &'a [Axis] {
        self.axes
    }

    /// Number of tuples, i.e., the product of all axis lengths.
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the tuple at position `index`, decoding the index as a mixed-radix number whose least
    /// significant digit belongs to the last axis.
    pub fn get(&self, index: usize) -> Option<ParameterTuple> {
        if index >= self.len() {
            return None;
        }
        let mut rem = index;
        let mut bindings = self
            .axes
            .iter()
            .rev()
            .map(|axis| {
                let digit = rem % axis.values.len();
                rem /= axis.values.len();
                Binding {
                    flag: axis.flag.clone(),
                    token: axis.token.clone(),
                    value: axis.values[digit].clone(),
                }
            })
            .collect_vec();
        bindings.reverse();
        Some(ParameterTuple { index, bindings })
    }

    /// Iterate over all tuples in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = ParameterTuple> + 'a {
        let grid = *self;
        (0..grid.len()).filter_map(move |i| grid.get(i))
    }
}
