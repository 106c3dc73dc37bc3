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
//! Rendering of the latency CDFs of all cohorts into one figure.

use std::{fs, io, path::Path};

use plotly::{
    color::NamedColor,
    common::{Anchor, DashType, Line, LineShape, Mode, Title},
    layout::{Axis, Legend},
    Layout, Plot, Scatter,
};

use crate::cdf::{Cohort, EmpiricalCdf};

/// Upper bound of the x-axis in milliseconds.
pub const DEFAULT_X_MAX: f64 = 450.0;

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("Cannot write the figure {0:?}: {1}")]
    Write(std::path::PathBuf, io::Error),
}

/// Color and dash style of the curve of a cohort.
fn style(cohort: Cohort) -> (NamedColor, DashType) {
    match cohort {
        Cohort::OnNetwork => (NamedColor::Black, DashType::Solid),
        Cohort::OffNetwork => (NamedColor::Blue, DashType::Dash),
        Cohort::Relay => (NamedColor::Green, DashType::Dot),
    }
}

/// Build the figure with one step curve per cohort.
pub fn cdf_figure<'a>(
    cdfs: impl IntoIterator<Item = (Cohort, &'a EmpiricalCdf)>,
    x_max: f64,
) -> Plot {
    let mut plot = Plot::new();
    for (cohort, cdf) in cdfs {
        let (color, dash) = style(cohort);
        let trace = Scatter::new(cdf.x().to_vec(), cdf.y().to_vec())
            .name(cohort.to_string())
            .mode(Mode::Lines)
            .line(Line::new().color(color).dash(dash).shape(LineShape::Hv));
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .x_axis(
            Axis::new()
                .title(Title::with_text("t (ms)"))
                .range(vec![0.0, x_max])
                .show_grid(true),
        )
        .y_axis(
            Axis::new()
                .title(Title::with_text("Probability that latency <= t"))
                .range(vec![0.0, 1.0])
                .show_grid(true),
        )
        .legend(
            Legend::new()
                .x(1.0)
                .x_anchor(Anchor::Right)
                .y(0.0)
                .y_anchor(Anchor::Bottom),
        );
    plot.set_layout(layout);
    plot
}

/// Write the figure as a standalone HTML page.
pub fn write_html(plot: &Plot, path: &Path) -> Result<(), PlotError> {
    fs::write(path, plot.to_html()).map_err(|e| PlotError::Write(path.to_path_buf(), e))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Export the figure as PDF.
#[cfg(feature = "pdf")]
pub fn write_pdf(plot: &Plot, path: &Path) -> Result<(), PlotError> {
    plot.write_image(path, plotly::ImageFormat::PDF, 800, 600, 1.0);
    log::debug!("Wrote {}", path.display());
    Ok(())
}
