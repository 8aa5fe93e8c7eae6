use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, SeedableRng as _};
use rand_distr::Normal;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::util::Output;

/// Noise is clipped to this many standard deviations around the series mean.
const NOISE_CLIP: f64 = 2.5;
/// Injected spikes lie between these many standard deviations from the mean.
const SPIKE_RANGE: std::ops::Range<f64> = 6.0..10.0;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Number of series to generate
    #[arg(long, default_value_t = 10)]
    num_series: usize,
    /// Number of hourly observations per series
    #[arg(long, default_value_t = 200)]
    num_points: usize,
    /// Number of injected outliers per series
    #[arg(long, default_value_t = 3)]
    outliers_per_series: usize,
    /// Random seed; a fresh one is drawn when absent
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path (stdout when absent)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Row {
    series_id: i64,
    values: f64,
    time_index: String,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    let GenerateArg {
        num_series,
        num_points,
        outliers_per_series,
        seed,
        output,
    } = arg;
    anyhow::ensure!(
        outliers_per_series <= num_points,
        "cannot inject {outliers_per_series} outliers into {num_points} points"
    );

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    tracing::info!(seed, "generating {num_series} series of {num_points} points");
    let mut rng = Pcg64::seed_from_u64(seed);
    let rows = generate_rows(&mut rng, *num_series, *num_points, *outliers_per_series)?;

    let output = Output::from_output_path(output.clone())?;
    let display_path = output.display_path();
    let mut writer = csv::Writer::from_writer(output);
    for row in &rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV to {display_path}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush output to {display_path}"))?;
    tracing::info!("wrote {} rows to {display_path}", rows.len());
    Ok(())
}

fn generate_rows<R>(
    rng: &mut R,
    num_series: usize,
    num_points: usize,
    outliers_per_series: usize,
) -> anyhow::Result<Vec<Row>>
where
    R: Rng,
{
    let start = DateTime::<Utc>::from_timestamp(1_609_459_200, 0).context("invalid start time")?;
    let mut rows = Vec::with_capacity(num_series * num_points);

    for series in 0..num_series {
        let series_id = i64::try_from(series + 1)?;
        let mean = rng.random_range(-10.0_f64..10.0);
        let std_dev = rng.random_range(0.5_f64..2.0);
        let noise = Normal::new(mean, std_dev).context("invalid noise distribution")?;

        let mut values = (0..num_points)
            .map(|_| {
                rng.sample(noise)
                    .clamp(mean - NOISE_CLIP * std_dev, mean + NOISE_CLIP * std_dev)
            })
            .collect::<Vec<_>>();

        // Alternate low and high spikes
        let positions = rand::seq::index::sample(rng, num_points, outliers_per_series);
        for (i, idx) in positions.into_iter().enumerate() {
            let offset = rng.random_range(SPIKE_RANGE.clone()) * std_dev;
            values[idx] = if i % 2 == 0 {
                mean - offset
            } else {
                mean + offset
            };
        }

        for (i, value) in values.into_iter().enumerate() {
            let time_index = start + TimeDelta::hours(i64::try_from(i)?);
            rows.push(Row {
                series_id,
                values: value,
                time_index: time_index.format("%Y-%m-%d %H:%M:%S").to_string(),
            });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use tsoutlier_analysis::{DataSet, SeriesId, ZScoreParams};

    use super::*;

    fn generate_csv(seed: u64, num_series: usize, num_points: usize, outliers: usize) -> String {
        let mut rng = Pcg64::seed_from_u64(seed);
        let rows = generate_rows(&mut rng, num_series, num_points, outliers).unwrap();
        let mut writer = csv::Writer::from_writer(vec![]);
        for row in &rows {
            writer.serialize(row).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_generated_data_loads() {
        let csv = generate_csv(1, 3, 50, 2);
        assert!(csv.starts_with("series_id,values,time_index\n"));

        let dataset = DataSet::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.num_rows(), 150);
        assert_eq!(
            dataset.series_ids(),
            &[SeriesId(1), SeriesId(2), SeriesId(3)]
        );
        let series = dataset.series(SeriesId(2));
        let (first, last) = series.time_span().unwrap();
        assert_eq!((last - first).num_hours(), 49);
    }

    #[test]
    fn test_same_seed_same_data() {
        assert_eq!(generate_csv(42, 2, 20, 1), generate_csv(42, 2, 20, 1));
        assert_ne!(generate_csv(42, 2, 20, 1), generate_csv(43, 2, 20, 1));
    }

    #[test]
    fn test_injected_outliers_are_detected() {
        let csv = generate_csv(7, 10, 200, 3);
        let dataset = DataSet::from_reader(csv.as_bytes()).unwrap();
        let report = dataset
            .std_dev_outliers(&ZScoreParams {
                top: true,
                ..ZScoreParams::default()
            })
            .unwrap();
        for series in &report.series {
            assert_eq!(series.flagged.len(), 3, "series {}", series.series_id);
        }
    }

    #[test]
    fn test_no_outliers() {
        let mut rng = Pcg64::seed_from_u64(0);
        let rows = generate_rows(&mut rng, 1, 10, 0).unwrap();
        assert_eq!(rows.len(), 10);
    }
}
