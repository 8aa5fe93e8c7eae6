use anyhow::Context;
use tsoutlier_analysis::{IqrParams, IqrReport};
use tsoutlier_plot::{BOX_PLOT_SIZE, draw_iqr_box_plot, draw_iqr_series, iqr_series_size};

use super::shared::{self, DatasetArg, OutputArg, SummaryRow};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct IqrArg {
    #[clap(flatten)]
    pub(crate) dataset: DatasetArg,
    /// Lower quantile probability
    #[arg(long, default_value_t = 0.25)]
    q1: f64,
    /// Upper quantile probability
    #[arg(long, default_value_t = 0.75)]
    q3: f64,
    /// Whisker multiplier applied to the interquartile range
    #[arg(long, default_value_t = 1.5)]
    whis: f64,
    /// Also flag observations above the upper fence
    #[arg(long)]
    top: bool,
    #[clap(flatten)]
    output: OutputArg,
}

impl IqrArg {
    pub(crate) fn params(&self) -> IqrParams {
        IqrParams {
            q1: self.q1,
            q3: self.q3,
            whis: self.whis,
            top: self.top,
        }
    }
}

pub(crate) fn run(arg: &IqrArg) -> anyhow::Result<()> {
    let params = arg.params();
    params.validate().context("Invalid IQR parameters")?;

    let dataset = arg.dataset.load()?;
    let report = dataset.interquartile_range_outliers(&params)?;

    let mut summary = arg.output.summary_writer();
    shared::write_summary(
        &mut summary,
        &format!(
            "IQR outliers (q1={}, q3={}, whis={}, top={})",
            params.q1, params.q3, params.whis, params.top
        ),
        &summary_rows(&report),
        &report.warnings,
    )
    .context("Failed to print summary")?;

    let path = arg.output.figure_path("iqr_boxplot.svg")?;
    util::write_svg(&path, BOX_PLOT_SIZE, |backend| {
        draw_iqr_box_plot(backend, &dataset, &report)
    })?;
    let path = arg.output.figure_path("iqr_series.svg")?;
    util::write_svg(&path, iqr_series_size(report.series.len()), |backend| {
        draw_iqr_series(backend, &dataset, &report)
    })?;

    arg.output.save_report(&report)?;
    Ok(())
}

fn summary_rows(report: &IqrReport) -> Vec<SummaryRow> {
    report
        .series
        .iter()
        .map(|s| SummaryRow::new(s.series_id, s.observations, &s.flagged))
        .collect()
}
