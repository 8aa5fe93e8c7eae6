//! Standard-deviation (z-score) outlier detection.
//!
//! Each series is normalized with its own mean and population standard
//! deviation, `z = (value - mean) / std_dev`. An observation is flagged when
//! `z < -std`; with `top` set, observations with `z > std` are flagged too.
//!
//! A constant series has zero standard deviation and cannot be normalized.
//! [`DegeneratePolicy`] selects whether such a series is skipped with a
//! warning or aborts the whole call.

use serde::Serialize;
use tsoutlier_stats::descriptive::DescriptiveStats;

use crate::{
    dataset::{DataSet, Series, SeriesId},
    outlier::{self, DetectError, DetectWarning, FlaggedPoint, OutlierSide, ParameterError},
};

/// How to treat a series whose standard deviation is zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Report no outliers for the series and record a warning.
    #[default]
    Skip,
    /// Fail with [`DetectError::DegenerateSeries`].
    Fail,
}

/// Parameters of the z-score detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZScoreParams {
    /// Deviation threshold in standard deviations.
    pub std: f64,
    /// Also flag observations above `+std`.
    pub top: bool,
    pub on_degenerate: DegeneratePolicy,
}

impl Default for ZScoreParams {
    fn default() -> Self {
        Self {
            std: 3.0,
            top: false,
            on_degenerate: DegeneratePolicy::Skip,
        }
    }
}

impl ZScoreParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !outlier::is_positive_finite(self.std) {
            return Err(ParameterError::NonPositiveThreshold { std: self.std });
        }
        Ok(())
    }

    /// Classifies a z-score against the threshold.
    #[must_use]
    pub fn classify(&self, z: f64) -> Option<OutlierSide> {
        if z < -self.std {
            Some(OutlierSide::Low)
        } else if self.top && z > self.std {
            Some(OutlierSide::High)
        } else {
            None
        }
    }
}

/// Z-score detection result for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesZScore {
    pub series_id: SeriesId,
    pub observations: usize,
    /// `None` for an empty series.
    pub mean: Option<f64>,
    /// `None` for an empty series.
    pub std_dev: Option<f64>,
    /// `true` if the series is constant and was not normalized.
    pub degenerate: bool,
    /// Normalized values in series order; empty when not normalized.
    pub z_scores: Vec<f64>,
    pub flagged: Vec<FlaggedPoint>,
}

impl SeriesZScore {
    fn empty(series_id: SeriesId) -> Self {
        Self {
            series_id,
            observations: 0,
            mean: None,
            std_dev: None,
            degenerate: false,
            z_scores: vec![],
            flagged: vec![],
        }
    }

    fn degenerate(series: &Series<'_>, stats: &DescriptiveStats) -> Self {
        Self {
            series_id: series.id(),
            observations: series.len(),
            mean: Some(stats.mean),
            std_dev: Some(stats.std_dev),
            degenerate: true,
            z_scores: vec![],
            flagged: vec![],
        }
    }

    fn normalized(series: &Series<'_>, stats: &DescriptiveStats, params: &ZScoreParams) -> Self {
        let z_scores = series
            .values()
            .map(|v| (v - stats.mean) / stats.std_dev)
            .collect::<Vec<_>>();
        let flagged = series
            .points()
            .iter()
            .zip(&z_scores)
            .enumerate()
            .filter_map(|(index, (point, &z))| {
                params
                    .classify(z)
                    .map(|side| FlaggedPoint::new(index, point, side))
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            series_id = %series.id(),
            mean = stats.mean,
            std_dev = stats.std_dev,
            flagged = flagged.len(),
            "normalized series"
        );

        Self {
            series_id: series.id(),
            observations: series.len(),
            mean: Some(stats.mean),
            std_dev: Some(stats.std_dev),
            degenerate: false,
            z_scores,
            flagged,
        }
    }

    /// Number of flagged observations.
    #[must_use]
    pub fn num_flagged(&self) -> usize {
        self.flagged.len()
    }
}

/// Z-score detection result for a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreReport {
    pub params: ZScoreParams,
    pub series: Vec<SeriesZScore>,
    pub warnings: Vec<DetectWarning>,
}

impl ZScoreReport {
    #[must_use]
    pub fn total_flagged(&self) -> usize {
        self.series.iter().map(SeriesZScore::num_flagged).sum()
    }

    #[must_use]
    pub fn get(&self, series_id: SeriesId) -> Option<&SeriesZScore> {
        self.series.iter().find(|s| s.series_id == series_id)
    }
}

impl DataSet {
    /// Flags outliers in every analysed series using z-score thresholding.
    ///
    /// Parameters are validated before any series is examined. With
    /// [`DegeneratePolicy::Fail`] the first constant series aborts the call.
    pub fn std_dev_outliers(&self, params: &ZScoreParams) -> Result<ZScoreReport, DetectError> {
        params.validate()?;

        let mut series = Vec::with_capacity(self.series_ids().len());
        let mut warnings = vec![];
        for s in self.iter_series() {
            let Some(stats) = DescriptiveStats::new(s.values()) else {
                tracing::warn!(series_id = %s.id(), "series has no observations");
                warnings.push(DetectWarning::EmptySeries { series_id: s.id() });
                series.push(SeriesZScore::empty(s.id()));
                continue;
            };
            if stats.is_constant() {
                if params.on_degenerate.is_fail() {
                    return Err(DetectError::DegenerateSeries { series_id: s.id() });
                }
                tracing::warn!(series_id = %s.id(), "series is constant; skipping normalization");
                warnings.push(DetectWarning::DegenerateSeries { series_id: s.id() });
                series.push(SeriesZScore::degenerate(&s, &stats));
                continue;
            }
            series.push(SeriesZScore::normalized(&s, &stats, params));
        }

        Ok(ZScoreReport {
            params: *params,
            series,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use rand::{Rng as _, SeedableRng as _};
    use rand_distr::Normal;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::dataset::Point;

    fn dataset(series: &[(i64, Vec<f64>)]) -> DataSet {
        DataSet::from_observations(series.iter().flat_map(|(id, values)| {
            values.iter().enumerate().map(move |(i, &value)| {
                let time_index =
                    DateTime::from_timestamp(i64::try_from(i).unwrap() * 3600, 0).unwrap();
                (SeriesId(*id), Point { time_index, value })
            })
        }))
    }

    fn normal_with_spikes(seed: u64) -> Vec<f64> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let normal = Normal::new(0.0_f64, 1.0).unwrap();
        let mut values = (0..100)
            .map(|_| rng.sample(normal).clamp(-2.5, 2.5))
            .collect::<Vec<_>>();
        values.insert(20, 10.0);
        values.insert(50, -10.0);
        values.insert(80, 8.0);
        values
    }

    #[test]
    fn test_injected_spikes_are_flagged() {
        let ds = dataset(&[(1, normal_with_spikes(7))]);
        let params = ZScoreParams {
            std: 3.0,
            top: true,
            ..ZScoreParams::default()
        };
        let report = ds.std_dev_outliers(&params).unwrap();
        let series = &report.series[0];
        assert_eq!(series.observations, 103);
        let flagged = series.flagged.iter().map(|f| (f.index, f.value)).collect::<Vec<_>>();
        assert_eq!(flagged, vec![(20, 10.0), (50, -10.0), (80, 8.0)]);
        assert!(series.flagged[1].side.is_low());
        assert!(series.flagged[0].side.is_high());

        let low_only = ds.std_dev_outliers(&ZScoreParams::default()).unwrap();
        let flagged = low_only.series[0]
            .flagged
            .iter()
            .map(|f| f.value)
            .collect::<Vec<_>>();
        assert_eq!(flagged, vec![-10.0]);
    }

    #[test]
    fn test_z_scores_are_normalized() {
        let ds = dataset(&[(1, vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])]);
        let report = ds.std_dev_outliers(&ZScoreParams::default()).unwrap();
        let series = &report.series[0];
        assert_eq!(series.mean, Some(5.0));
        assert_eq!(series.std_dev, Some(2.0));
        let expected = [-1.5, -0.5, -0.5, -0.5, 0.0, 0.0, 1.0, 2.0];
        for (z, e) in series.z_scores.iter().zip(expected) {
            assert!((z - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_flag_sets_shrink_as_threshold_grows() {
        let ds = dataset(&[(1, normal_with_spikes(11)), (2, normal_with_spikes(12))]);
        for is_top in [false, true] {
            let mut previous: Option<Vec<Vec<usize>>> = None;
            for std in [0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0] {
                let params = ZScoreParams {
                    std,
                    top: is_top,
                    ..ZScoreParams::default()
                };
                let report = ds.std_dev_outliers(&params).unwrap();
                let current = report
                    .series
                    .iter()
                    .map(|s| s.flagged.iter().map(|f| f.index).collect::<Vec<_>>())
                    .collect::<Vec<_>>();
                if let Some(previous) = &previous {
                    for (prev, cur) in previous.iter().zip(&current) {
                        assert!(cur.len() <= prev.len());
                        assert!(cur.iter().all(|idx| prev.contains(idx)));
                    }
                }
                previous = Some(current);
            }
        }
    }

    #[test]
    fn test_constant_series_is_skipped() {
        let ds = dataset(&[(1, vec![3.0; 12]), (2, normal_with_spikes(3))]);
        let params = ZScoreParams {
            top: true,
            ..ZScoreParams::default()
        };
        let report = ds.std_dev_outliers(&params).unwrap();

        let constant = report.get(SeriesId(1)).unwrap();
        assert!(constant.degenerate);
        assert_eq!(constant.num_flagged(), 0);
        assert!(constant.z_scores.is_empty());
        assert_eq!(
            report.warnings,
            vec![DetectWarning::DegenerateSeries {
                series_id: SeriesId(1)
            }]
        );
        assert_eq!(report.get(SeriesId(2)).unwrap().num_flagged(), 3);
    }

    #[test]
    fn test_constant_series_can_fail() {
        let ds = dataset(&[(1, vec![1.0, 2.0, 3.0]), (5, vec![0.25; 4])]);
        let params = ZScoreParams {
            on_degenerate: DegeneratePolicy::Fail,
            ..ZScoreParams::default()
        };
        let err = ds.std_dev_outliers(&params).unwrap_err();
        assert!(matches!(
            err,
            DetectError::DegenerateSeries {
                series_id: SeriesId(5)
            }
        ));
    }

    #[test]
    fn test_invalid_threshold() {
        let ds = dataset(&[(1, vec![1.0, 2.0, 3.0])]);
        for std in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let params = ZScoreParams {
                std,
                ..ZScoreParams::default()
            };
            let err = ds.std_dev_outliers(&params).unwrap_err();
            assert!(matches!(
                err,
                DetectError::Parameter(ParameterError::NonPositiveThreshold { .. })
            ));
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let ds = dataset(&[(1, normal_with_spikes(1)), (2, normal_with_spikes(2))]);
        let params = ZScoreParams {
            std: 2.0,
            top: true,
            ..ZScoreParams::default()
        };
        let first = ds.std_dev_outliers(&params).unwrap();
        let second = ds.std_dev_outliers(&params).unwrap();
        assert_eq!(first, second);
        let timestamps = |report: &ZScoreReport| {
            report
                .series
                .iter()
                .flat_map(|s| s.flagged.iter().map(|f| f.time_index))
                .collect::<Vec<_>>()
        };
        assert_eq!(timestamps(&first), timestamps(&second));
    }

    #[test]
    fn test_empty_series_is_a_warning() {
        let ds = dataset(&[(1, vec![1.0, 2.0, 3.0])]).with_series_ids([SeriesId(9), SeriesId(1)]);
        let report = ds.std_dev_outliers(&ZScoreParams::default()).unwrap();
        assert_eq!(report.series[0].series_id, SeriesId(9));
        assert_eq!(report.series[0].observations, 0);
        assert!(report.series[0].mean.is_none());
        assert_eq!(
            report.warnings,
            vec![DetectWarning::EmptySeries {
                series_id: SeriesId(9)
            }]
        );
    }

    #[test]
    fn test_report_serializes() {
        let ds = dataset(&[(1, vec![1.0, 2.0, 3.0, -30.0])]);
        let report = ds.std_dev_outliers(&ZScoreParams {
            std: 1.0,
            ..ZScoreParams::default()
        });
        let json = serde_json::to_value(report.unwrap()).unwrap();
        assert_eq!(json["params"]["on_degenerate"], "skip");
        assert_eq!(json["series"][0]["series_id"], 1);
        assert_eq!(json["series"][0]["flagged"][0]["side"], "low");
        assert_eq!(
            json["series"][0]["flagged"][0]["time_index"],
            "1970-01-01T03:00:00Z"
        );
    }
}
