use plotters::{coord::combinators::BindKeyPoints as _, prelude::*, style::full_palette::ORANGE};
use tsoutlier_analysis::{DataSet, IqrFences, IqrReport, SeriesId};

use crate::{FONT, PlotError, padded};

const BOX_HALF_WIDTH: f64 = 0.3;
const CAP_HALF_WIDTH: f64 = 0.15;

/// Draws every series of an IQR report side by side as a box plot.
///
/// Boxes span the report's `q1..q3` quantiles with the median marked;
/// whiskers end at the most extreme values inside the fences, and values
/// beyond the fences are drawn as hollow circles. The figure uses the
/// quantiles the report was computed with, not fixed quartiles.
#[expect(clippy::cast_precision_loss)]
pub fn draw_iqr_box_plot<DB>(
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

    let Some((lo, hi)) = value_span(dataset, report) else {
        root.present()?;
        return Ok(());
    };

    let labels = report.series.iter().map(|s| s.series_id).collect::<Vec<_>>();
    let params = &report.params;
    // One tick per box, whatever the number of series
    let centers = (1..=labels.len()).map(|k| k as f64).collect::<Vec<_>>();

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "IQR box plot (q1={}, q3={}, whis={})",
                params.q1, params.q3, params.whis
            ),
            (FONT, 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0.5..labels.len() as f64 + 0.5).with_key_points(centers),
            padded(lo, hi),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x: &f64| series_label(&labels, *x))
        .y_desc("value")
        .draw()?;

    let boxes = report
        .series
        .iter()
        .enumerate()
        .filter_map(|(i, series)| series.fences.map(|fences| ((i + 1) as f64, series, fences)))
        .collect::<Vec<_>>();

    chart
        .draw_series(boxes.iter().map(|&(c, _, fences)| {
            Rectangle::new(box_corners(c, &fences), BLUE.mix(0.2).filled())
        }))?
        .label("q1 to q3")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.2).filled()));
    chart.draw_series(
        boxes
            .iter()
            .map(|&(c, _, fences)| Rectangle::new(box_corners(c, &fences), BLUE.stroke_width(2))),
    )?;

    chart
        .draw_series(boxes.iter().map(|&(c, _, fences)| {
            PathElement::new(
                vec![
                    (c - BOX_HALF_WIDTH, fences.median),
                    (c + BOX_HALF_WIDTH, fences.median),
                ],
                ORANGE.stroke_width(3),
            )
        }))?
        .label("median")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(3)));

    chart.draw_series(
        boxes
            .iter()
            .filter_map(|&(c, series, fences)| {
                series.whiskers.map(|whiskers| whisker_paths(c, &fences, whiskers))
            })
            .flatten()
            .map(|path| PathElement::new(path, BLACK.stroke_width(1))),
    )?;

    chart
        .draw_series(
            boxes
                .iter()
                .flat_map(|&(c, series, fences)| {
                    fliers(dataset, series.series_id, fences).map(move |v| (c, v))
                })
                .map(|coord| Circle::new(coord, 4, BLACK.stroke_width(1))),
        )?
        .label("beyond fences")
        .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.stroke_width(1)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Range of all values of the report's series, or `None` if they are all empty.
fn value_span(dataset: &DataSet, report: &IqrReport) -> Option<(f64, f64)> {
    report
        .series
        .iter()
        .filter_map(|s| dataset.series(s.series_id).value_span())
        .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn series_label(labels: &[SeriesId], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 1.0 || rounded > labels.len() as f64 {
        return String::new();
    }
    format!("Series {}", labels[rounded as usize - 1])
}

fn box_corners(c: f64, fences: &IqrFences) -> [(f64, f64); 2] {
    [
        (c - BOX_HALF_WIDTH, fences.q1),
        (c + BOX_HALF_WIDTH, fences.q3),
    ]
}

fn whisker_paths(c: f64, fences: &IqrFences, (lower, upper): (f64, f64)) -> [Vec<(f64, f64)>; 4] {
    [
        vec![(c, lower), (c, fences.q1)],
        vec![(c, fences.q3), (c, upper)],
        vec![(c - CAP_HALF_WIDTH, lower), (c + CAP_HALF_WIDTH, lower)],
        vec![(c - CAP_HALF_WIDTH, upper), (c + CAP_HALF_WIDTH, upper)],
    ]
}

/// Values of a series lying beyond its fences, regardless of which side is flagged.
fn fliers(
    dataset: &DataSet,
    series_id: SeriesId,
    fences: IqrFences,
) -> impl Iterator<Item = f64> + '_ {
    dataset
        .series(series_id)
        .values()
        .filter(move |&v| !fences.contains(v))
}

#[cfg(test)]
mod tests {
    use tsoutlier_analysis::IqrParams;

    use super::*;

    const CSV: &str = "\
series_id,values,time_index
1,1.0,2021-01-01
1,2.0,2021-01-02
1,3.0,2021-01-03
1,4.0,2021-01-04
1,5.0,2021-01-05
1,100.0,2021-01-06
2,-3.0,2021-01-01
2,0.0,2021-01-02
2,3.0,2021-01-03
";

    #[test]
    fn test_draws_caption_with_parameters() {
        let dataset = DataSet::from_reader(CSV.as_bytes()).unwrap();
        let params = IqrParams {
            q1: 0.1,
            q3: 0.9,
            ..IqrParams::default()
        };
        let report = dataset.interquartile_range_outliers(&params).unwrap();

        let mut svg = String::new();
        draw_iqr_box_plot(
            SVGBackend::with_string(&mut svg, crate::BOX_PLOT_SIZE),
            &dataset,
            &report,
        )
        .unwrap();
        assert!(svg.contains("IQR box plot (q1=0.1, q3=0.9, whis=1.5)"));
        assert!(svg.contains("median"));
    }

    #[test]
    fn test_fliers_are_values_outside_fences() {
        let dataset = DataSet::from_reader(CSV.as_bytes()).unwrap();
        let report = dataset
            .interquartile_range_outliers(&IqrParams::default())
            .unwrap();

        let series = report.get(SeriesId(1)).unwrap();
        let fences = series.fences.unwrap();
        // Upper fliers are drawn even when `top` is off
        assert!(series.flagged.is_empty());
        assert_eq!(
            fliers(&dataset, SeriesId(1), fences).collect::<Vec<_>>(),
            vec![100.0]
        );

        let fences = report.get(SeriesId(2)).unwrap().fences.unwrap();
        assert_eq!(fliers(&dataset, SeriesId(2), fences).count(), 0);
    }

    #[test]
    fn test_series_label() {
        let labels = [SeriesId(7), SeriesId(9)];
        assert_eq!(series_label(&labels, 1.0), "Series 7");
        assert_eq!(series_label(&labels, 2.0), "Series 9");
        assert_eq!(series_label(&labels, 1.5), "");
        assert_eq!(series_label(&labels, 0.0), "");
        assert_eq!(series_label(&labels, 3.0), "");
    }

    #[test]
    fn test_every_box_is_labelled() {
        let csv = (1..=13)
            .flat_map(|id| (1..=4).map(move |day| format!("{id},{day}.0,2021-01-0{day}\n")))
            .collect::<String>();
        let dataset =
            DataSet::from_reader(format!("series_id,values,time_index\n{csv}").as_bytes()).unwrap();
        let report = dataset
            .interquartile_range_outliers(&IqrParams::default())
            .unwrap();

        let mut svg = String::new();
        draw_iqr_box_plot(
            SVGBackend::with_string(&mut svg, crate::BOX_PLOT_SIZE),
            &dataset,
            &report,
        )
        .unwrap();
        for id in 1..=13 {
            assert!(svg.contains(&format!(">Series {id}<")), "missing label for series {id}");
        }
    }

    #[test]
    fn test_empty_report_renders_blank_figure() {
        let dataset = DataSet::from_observations([]);
        let report = dataset
            .interquartile_range_outliers(&IqrParams::default())
            .unwrap();

        let mut svg = String::new();
        draw_iqr_box_plot(
            SVGBackend::with_string(&mut svg, crate::BOX_PLOT_SIZE),
            &dataset,
            &report,
        )
        .unwrap();
        assert!(svg.contains("<svg"));
    }
}
