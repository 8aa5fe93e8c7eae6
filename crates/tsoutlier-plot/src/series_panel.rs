use chrono::{DateTime, TimeDelta, Utc};
use plotters::{coord::Shift, prelude::*};
use tsoutlier_analysis::{DataSet, FlaggedPoint, IqrReport, Series};

use crate::{FONT, PlotError, padded};

/// Draws one line panel per series of an IQR report, stacked vertically.
///
/// Each panel shows the raw series and a red cross at every flagged
/// observation, with the flagged count in the legend.
pub fn draw_iqr_series<DB>(
    backend: DB,
    dataset: &DataSet,
    report: &IqrReport,
) -> Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    if !report.series.is_empty() {
        let panels = root.split_evenly((report.series.len(), 1));
        for (panel, result) in panels.iter().zip(&report.series) {
            let series = dataset.series(result.series_id);
            draw_series_panel(panel, &series, &result.flagged)?;
        }
    }

    root.present()?;
    Ok(())
}

/// Draws a single series as a line with its flagged observations marked.
pub(crate) fn draw_series_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    series: &Series<'_>,
    flagged: &[FlaggedPoint],
) -> Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let id = series.id();
    let (Some((first, last)), Some((lo, hi))) = (series.time_span(), series.value_span()) else {
        area.titled(&format!("Series {id}: no observations"), (FONT, 18))?;
        return Ok(());
    };
    let (first, last) = time_axis(first, last);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(first..last, padded(lo, hi))?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x: &DateTime<Utc>| x.format("%Y-%m-%d %H:%M").to_string())
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            series.points().iter().map(|p| (p.time_index, p.value)),
            &BLUE,
        ))?
        .label(format!("Series {id}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .draw_series(
            flagged
                .iter()
                .map(|f| Cross::new((f.time_index, f.value), 5, RED.stroke_width(2))),
        )?
        .label(format!("Outliers (total: {})", flagged.len()))
        .legend(|(x, y)| Cross::new((x + 10, y), 5, RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// A single timestamp is widened to an hour on either side so the axis is never empty.
fn time_axis(first: DateTime<Utc>, last: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    if first < last {
        (first, last)
    } else {
        (first - TimeDelta::hours(1), last + TimeDelta::hours(1))
    }
}
