use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use tsoutlier_analysis::{DataSet, DetectWarning, FlaggedPoint, OutlierSide, SeriesId};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DatasetArg {
    /// Input CSV with `series_id`, `values` and `time_index` columns
    pub(crate) data: PathBuf,
    /// Analyse only these series ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub(crate) series: Vec<i64>,
}

impl DatasetArg {
    pub(crate) fn load(&self) -> anyhow::Result<DataSet> {
        let dataset = DataSet::open(&self.data)
            .with_context(|| format!("Failed to load dataset: {}", self.data.display()))?;
        tracing::info!(
            rows = dataset.num_rows(),
            series = dataset.series_ids().len(),
            "loaded {}",
            self.data.display()
        );
        if self.series.is_empty() {
            return Ok(dataset);
        }
        Ok(dataset.with_series_ids(self.series.iter().copied().map(SeriesId)))
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct OutputArg {
    /// Directory the figures are written to
    #[arg(long, default_value = "figures")]
    pub(crate) output_dir: PathBuf,
    /// Write the detection report as JSON to this file (`-` for stdout)
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,
}

impl OutputArg {
    /// Path of a figure inside the output directory, creating the directory if needed.
    pub(crate) fn figure_path(&self, file_name: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;
        Ok(self.output_dir.join(file_name))
    }

    pub(crate) fn report_to_stdout(&self) -> bool {
        self.report.as_ref().is_some_and(|path| path.as_os_str() == "-")
    }

    pub(crate) fn save_report<T>(&self, report: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let Some(path) = &self.report else {
            return Ok(());
        };
        let path = (!self.report_to_stdout()).then(|| path.clone());
        Output::save_json(report, path)
    }

    /// Where the human-readable summary goes: stderr when stdout carries the JSON report.
    pub(crate) fn summary_writer(&self) -> Box<dyn Write> {
        if self.report_to_stdout() {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        }
    }
}

/// Per-series line of the detection summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SummaryRow {
    pub(crate) series_id: SeriesId,
    pub(crate) observations: usize,
    pub(crate) low: usize,
    pub(crate) high: usize,
}

impl SummaryRow {
    pub(crate) fn new(series_id: SeriesId, observations: usize, flagged: &[FlaggedPoint]) -> Self {
        let low = flagged.iter().filter(|f| f.side == OutlierSide::Low).count();
        Self {
            series_id,
            observations,
            low,
            high: flagged.len() - low,
        }
    }
}

pub(crate) fn write_summary<W>(
    writer: &mut W,
    title: &str,
    rows: &[SummaryRow],
    warnings: &[DetectWarning],
) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writeln!(writer, "{title}")?;
    writeln!(
        writer,
        "{:>10} {:>12} {:>8} {:>8} {:>8}",
        "series_id", "observations", "low", "high", "total"
    )?;
    for row in rows {
        writeln!(
            writer,
            "{:>10} {:>12} {:>8} {:>8} {:>8}",
            row.series_id.to_string(),
            row.observations,
            row.low,
            row.high,
            row.low + row.high
        )?;
    }
    let total = rows.iter().map(|r| r.low + r.high).sum::<usize>();
    writeln!(writer, "Total flagged: {total}")?;
    for warning in warnings {
        writeln!(writer, "warning: {warning}")?;
    }
    Ok(())
}
