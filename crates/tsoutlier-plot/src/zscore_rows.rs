use std::ops::Range;

use plotters::{coord::Shift, prelude::*, series::DashedLineSeries};
use tsoutlier_analysis::{DataSet, SeriesZScore, ZScoreReport};
use tsoutlier_stats::histogram::Histogram;

use crate::{FONT, PlotError, padded, series_panel::draw_series_panel};

const HISTOGRAM_BINS: usize = 20;

/// Draws one row per series of a z-score report.
///
/// The left 30% of a row is a histogram of the series' z-scores with dashed
/// lines at the `±std` threshold; the rest is the series line panel with
/// flagged observations marked.
pub fn draw_zscore_rows<DB>(
    backend: DB,
    dataset: &DataSet,
    report: &ZScoreReport,
) -> Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;

    if !report.series.is_empty() {
        let rows = root.split_evenly((report.series.len(), 1));
        for (row, result) in rows.iter().zip(&report.series) {
            let (width, _height) = row.dim_in_pixel();
            let (left, right) = row.split_horizontally(width * 3 / 10);
            draw_histogram(&left, result, report.params.std)?;
            let series = dataset.series(result.series_id);
            draw_series_panel(&right, &series, &result.flagged)?;
        }
    }

    root.present()?;
    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn draw_histogram<DB>(
    area: &DrawingArea<DB, Shift>,
    result: &SeriesZScore,
    threshold: f64,
) -> Result<(), PlotError>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let id = result.series_id;
    if result.degenerate {
        area.titled(
            &format!("Series {id}: constant series, not normalized"),
            (FONT, 18),
        )?;
        return Ok(());
    }
    let Some(span) = finite_span(&result.z_scores) else {
        area.titled(&format!("Series {id}: no observations"), (FONT, 18))?;
        return Ok(());
    };

    // The axis always shows both threshold lines
    let x_range = padded(span.start.min(-threshold), span.end.max(threshold));
    let histogram = Histogram::with_range(
        result.z_scores.iter().copied(),
        HISTOGRAM_BINS,
        x_range.clone(),
    );
    let y_top = histogram.max_count().max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Series {id} z-scores"), (FONT, 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range, 0.0..y_top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("z-score")
        .y_desc("count")
        .draw()?;

    chart.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.range.start, 0.0), (bin.range.end, bin.count as f64)],
            BLUE.mix(0.5).filled(),
        )
    }))?;

    let style = RED.stroke_width(2);
    chart
        .draw_series(DashedLineSeries::new(
            [(-threshold, 0.0), (-threshold, y_top)],
            10,
            6,
            style,
        ))?
        .label(format!("threshold ±{threshold}"))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    chart.draw_series(DashedLineSeries::new(
        [(threshold, 0.0), (threshold, y_top)],
        10,
        6,
        style,
    ))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

fn finite_span(values: &[f64]) -> Option<Range<f64>> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |span, v| match span {
            None => Some(v..v),
            Some(Range { start, end }) => Some(start.min(v)..end.max(v)),
        })
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use tsoutlier_analysis::{Point, SeriesId, ZScoreParams};

    use super::*;

    fn dataset(series: &[(i64, Vec<f64>)]) -> DataSet {
        DataSet::from_observations(series.iter().flat_map(|(id, values)| {
            values.iter().enumerate().map(move |(i, &value)| {
                let time_index =
                    DateTime::from_timestamp(i64::try_from(i).unwrap() * 3600, 0).unwrap();
                (SeriesId(*id), Point { time_index, value })
            })
        }))
    }

    #[test]
    fn test_draws_histogram_and_line_panel() {
        let mut values = vec![10.0; 19];
        values.push(-40.0);
        let dataset = dataset(&[(1, values), (2, vec![4.0; 5])]);
        let report = dataset.std_dev_outliers(&ZScoreParams::default()).unwrap();
        assert_eq!(report.get(SeriesId(1)).unwrap().flagged.len(), 1);

        let mut svg = String::new();
        draw_zscore_rows(
            SVGBackend::with_string(&mut svg, crate::zscore_size(report.series.len())),
            &dataset,
            &report,
        )
        .unwrap();
        assert!(svg.contains("Series 1 z-scores"));
        assert!(svg.contains("threshold"));
        assert!(svg.contains("Outliers (total: 1)"));
        assert!(svg.contains("Series 2: constant series, not normalized"));
    }

    #[test]
    fn test_empty_report_still_renders() {
        let dataset = dataset(&[]);
        let report = dataset.std_dev_outliers(&ZScoreParams::default()).unwrap();

        let mut svg = String::new();
        draw_zscore_rows(
            SVGBackend::with_string(&mut svg, crate::zscore_size(0)),
            &dataset,
            &report,
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_finite_span() {
        assert_eq!(finite_span(&[]), None);
        assert_eq!(finite_span(&[f64::NAN, 2.0, -1.0]), Some(-1.0..2.0));
    }
}
