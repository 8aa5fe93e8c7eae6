//! Rendering of outlier reports with `plotters`.
//!
//! Every function takes any [`DrawingBackend`](plotters::prelude::DrawingBackend),
//! draws one complete figure and presents it. Writing the figure somewhere
//! (a file, a string, a window) is the backend's job.
//!
//! - [`draw_iqr_box_plot`]: all series side by side as box plots using the report's fences
//! - [`draw_iqr_series`]: one line panel per series with IQR outliers marked
//! - [`draw_zscore_rows`]: one row per series, z-score histogram next to a line panel
//!
//! ```
//! use plotters::prelude::SVGBackend;
//! use tsoutlier_analysis::{DataSet, IqrParams};
//! use tsoutlier_plot::{BOX_PLOT_SIZE, draw_iqr_box_plot};
//!
//! let csv = "series_id,values,time_index\n1,1.0,2021-01-01\n1,2.0,2021-01-02\n1,9.0,2021-01-03\n";
//! let dataset = DataSet::from_reader(csv.as_bytes()).unwrap();
//! let report = dataset.interquartile_range_outliers(&IqrParams::default()).unwrap();
//!
//! let mut svg = String::new();
//! draw_iqr_box_plot(SVGBackend::with_string(&mut svg, BOX_PLOT_SIZE), &dataset, &report).unwrap();
//! assert!(svg.contains("<svg"));
//! ```

use std::{error::Error, fmt, ops::Range};

use plotters::drawing::DrawingAreaErrorKind;

pub use self::{box_plot::draw_iqr_box_plot, series_panel::draw_iqr_series, zscore_rows::draw_zscore_rows};

mod box_plot;
mod series_panel;
mod zscore_rows;

/// Pixel size of the box plot figure.
pub const BOX_PLOT_SIZE: (u32, u32) = (2000, 500);

const SERIES_PANEL_HEIGHT: u32 = 400;
const ZSCORE_ROW_HEIGHT: u32 = 500;
const FIGURE_WIDTH: u32 = 2000;

const FONT: &str = "sans-serif";

/// Pixel size of the stacked line-panel figure for `num_series` series.
#[must_use]
pub fn iqr_series_size(num_series: usize) -> (u32, u32) {
    (FIGURE_WIDTH, stacked_height(num_series, SERIES_PANEL_HEIGHT))
}

/// Pixel size of the z-score figure for `num_series` series.
#[must_use]
pub fn zscore_size(num_series: usize) -> (u32, u32) {
    (FIGURE_WIDTH, stacked_height(num_series, ZSCORE_ROW_HEIGHT))
}

fn stacked_height(num_series: usize, row_height: u32) -> u32 {
    u32::try_from(num_series.max(1))
        .unwrap_or(u32::MAX)
        .saturating_mul(row_height)
}

/// An error raised by the drawing backend.
#[derive(Debug)]
pub struct PlotError(Box<dyn Error + Send + Sync>);

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to draw figure: {}", self.0)
    }
}

impl Error for PlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

impl<E> From<DrawingAreaErrorKind<E>> for PlotError
where
    E: Error + Send + Sync + 'static,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self(Box::new(err))
    }
}

/// Axis range around `lo..hi` with a 5% margin; degenerate spans are widened by one unit.
fn padded(lo: f64, hi: f64) -> Range<f64> {
    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0..1.0;
    }
    if hi <= lo {
        return (lo - 1.0)..(hi + 1.0);
    }
    let margin = (hi - lo) * 0.05;
    (lo - margin)..(hi + margin)
}
