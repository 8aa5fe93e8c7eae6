use anyhow::Context;
use tsoutlier_analysis::{DegeneratePolicy, ZScoreParams, ZScoreReport};
use tsoutlier_plot::{draw_zscore_rows, zscore_size};

use super::shared::{self, DatasetArg, OutputArg, SummaryRow};
use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ZScoreArg {
    #[clap(flatten)]
    pub(crate) dataset: DatasetArg,
    /// Deviation threshold in standard deviations
    #[arg(long, default_value_t = 3.0)]
    std: f64,
    /// Also flag observations above the threshold
    #[arg(long)]
    top: bool,
    /// Fail on constant series instead of skipping them
    #[arg(long)]
    fail_on_degenerate: bool,
    #[clap(flatten)]
    output: OutputArg,
}

impl ZScoreArg {
    pub(crate) fn params(&self) -> ZScoreParams {
        ZScoreParams {
            std: self.std,
            top: self.top,
            on_degenerate: if self.fail_on_degenerate {
                DegeneratePolicy::Fail
            } else {
                DegeneratePolicy::Skip
            },
        }
    }
}

pub(crate) fn run(arg: &ZScoreArg) -> anyhow::Result<()> {
    let params = arg.params();
    params.validate().context("Invalid z-score parameters")?;

    let dataset = arg.dataset.load()?;
    let report = dataset.std_dev_outliers(&params)?;

    let mut summary = arg.output.summary_writer();
    shared::write_summary(
        &mut summary,
        &format!("Z-score outliers (std={}, top={})", params.std, params.top),
        &summary_rows(&report),
        &report.warnings,
    )
    .context("Failed to print summary")?;

    let path = arg.output.figure_path("zscore.svg")?;
    util::write_svg(&path, zscore_size(report.series.len()), |backend| {
        draw_zscore_rows(backend, &dataset, &report)
    })?;

    arg.output.save_report(&report)?;
    Ok(())
}

fn summary_rows(report: &ZScoreReport) -> Vec<SummaryRow> {
    report
        .series
        .iter()
        .map(|s| SummaryRow::new(s.series_id, s.observations, &s.flagged))
        .collect()
}
