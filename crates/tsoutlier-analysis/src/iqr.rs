//! Interquartile-range (IQR) outlier detection.
//!
//! For each series the empirical quantiles `Q1` and `Q3` are computed and the
//! fences are placed at
//!
//! ```text
//! low = Q1 - whis * (Q3 - Q1)
//! up  = Q3 + whis * (Q3 - Q1)
//! ```
//!
//! An observation is flagged when it lies below `low`; with `top` set,
//! observations above `up` are flagged as well.
//!
//! A series whose quantiles coincide has `IQR = 0`, so the fences collapse
//! onto the quantile value and any observation different from it on a flagged
//! side is an outlier. This is the expected behavior of the rule, not an error.
//! A series in which every value is identical therefore has no outliers.
//!
//! # Examples
//!
//! ```
//! use chrono::DateTime;
//! use tsoutlier_analysis::{DataSet, IqrParams, Point, SeriesId};
//!
//! let observations = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(i, value)| {
//!         let time_index = DateTime::from_timestamp(i as i64 * 3600, 0).unwrap();
//!         (SeriesId(1), Point { time_index, value })
//!     });
//! let dataset = DataSet::from_observations(observations);
//!
//! let report = dataset
//!     .interquartile_range_outliers(&IqrParams::default())
//!     .unwrap();
//! assert_eq!(report.total_flagged(), 0);
//!
//! let params = IqrParams { top: true, ..IqrParams::default() };
//! let report = dataset.interquartile_range_outliers(&params).unwrap();
//! assert_eq!(report.series[0].flagged[0].value, 100.0);
//! ```

use serde::Serialize;
use tsoutlier_stats::quantiles::Quantiles;

use crate::{
    dataset::{DataSet, Series, SeriesId},
    outlier::{self, DetectError, DetectWarning, FlaggedPoint, OutlierSide, ParameterError},
};

/// Parameters of the IQR detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrParams {
    /// Lower quantile probability, in `(0, 1)`.
    pub q1: f64,
    /// Upper quantile probability, in `(0, 1)` and greater than `q1`.
    pub q3: f64,
    /// Whisker multiplier applied to the interquartile range.
    pub whis: f64,
    /// Also flag observations above the upper fence.
    pub top: bool,
}

impl Default for IqrParams {
    fn default() -> Self {
        Self {
            q1: 0.25,
            q3: 0.75,
            whis: 1.5,
            top: false,
        }
    }
}

impl IqrParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [("Q1", self.q1), ("Q3", self.q3)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ParameterError::QuantileOutOfRange { name, value });
            }
        }
        if self.q3 <= self.q1 {
            return Err(ParameterError::QuantileOrder {
                q1: self.q1,
                q3: self.q3,
            });
        }
        if !outlier::is_positive_finite(self.whis) {
            return Err(ParameterError::NonPositiveWhisker { whis: self.whis });
        }
        Ok(())
    }
}

/// Quantiles and fences computed for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrFences {
    /// Value at the lower quantile probability.
    pub q1: f64,
    pub median: f64,
    /// Value at the upper quantile probability.
    pub q3: f64,
    pub iqr: f64,
    pub low: f64,
    pub up: f64,
}

impl IqrFences {
    /// Computes the fences of a sorted, non-empty series.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], params: &IqrParams) -> Option<Self> {
        if sorted_values.is_empty() {
            return None;
        }
        let quantiles = Quantiles::from_sorted(sorted_values, &[params.q1, 0.5, params.q3]);
        let &[(_, q1), (_, median), (_, q3)] = quantiles.as_slice() else {
            return None;
        };
        let iqr = q3 - q1;
        Some(Self {
            q1,
            median,
            q3,
            iqr,
            low: q1 - params.whis * iqr,
            up: q3 + params.whis * iqr,
        })
    }

    /// Classifies a value against the fences.
    ///
    /// Values above the upper fence are only flagged when `top` is set.
    #[must_use]
    pub fn classify(&self, value: f64, top: bool) -> Option<OutlierSide> {
        if value < self.low {
            Some(OutlierSide::Low)
        } else if top && value > self.up {
            Some(OutlierSide::High)
        } else {
            None
        }
    }

    /// Returns `true` if the value lies within `[low, up]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.low..=self.up).contains(&value)
    }
}

/// IQR detection result for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesIqr {
    pub series_id: SeriesId,
    pub observations: usize,
    /// `None` for an empty series.
    pub fences: Option<IqrFences>,
    /// Most extreme observations inside the fences, as drawn by box-plot whiskers.
    pub whiskers: Option<(f64, f64)>,
    pub flagged: Vec<FlaggedPoint>,
}

impl SeriesIqr {
    fn empty(series_id: SeriesId) -> Self {
        Self {
            series_id,
            observations: 0,
            fences: None,
            whiskers: None,
            flagged: vec![],
        }
    }

    fn detect(series: &Series<'_>, params: &IqrParams) -> Self {
        let sorted = series.sorted_values();
        let Some(fences) = IqrFences::from_sorted(&sorted, params) else {
            return Self::empty(series.id());
        };

        let flagged = series
            .points()
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                fences
                    .classify(point.value, params.top)
                    .map(|side| FlaggedPoint::new(index, point, side))
            })
            .collect::<Vec<_>>();

        // Whiskers never end inside the box
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|&v| fences.contains(v))
            .map(|v| v.min(fences.q1));
        let upper_whisker = sorted
            .iter()
            .copied()
            .rev()
            .find(|&v| fences.contains(v))
            .map(|v| v.max(fences.q3));
        let whiskers = lower_whisker.zip(upper_whisker);

        tracing::debug!(
            series_id = %series.id(),
            q1 = fences.q1,
            q3 = fences.q3,
            low = fences.low,
            up = fences.up,
            flagged = flagged.len(),
            "computed IQR fences"
        );

        Self {
            series_id: series.id(),
            observations: series.len(),
            fences: Some(fences),
            whiskers,
            flagged,
        }
    }

    /// Number of flagged observations.
    #[must_use]
    pub fn num_flagged(&self) -> usize {
        self.flagged.len()
    }
}

/// IQR detection result for a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IqrReport {
    pub params: IqrParams,
    pub series: Vec<SeriesIqr>,
    pub warnings: Vec<DetectWarning>,
}

impl IqrReport {
    #[must_use]
    pub fn total_flagged(&self) -> usize {
        self.series.iter().map(SeriesIqr::num_flagged).sum()
    }

    #[must_use]
    pub fn get(&self, series_id: SeriesId) -> Option<&SeriesIqr> {
        self.series.iter().find(|s| s.series_id == series_id)
    }
}

impl DataSet {
    /// Flags outliers in every analysed series using IQR fencing.
    ///
    /// Parameters are validated before any series is examined.
    pub fn interquartile_range_outliers(
        &self,
        params: &IqrParams,
    ) -> Result<IqrReport, DetectError> {
        params.validate()?;

        let mut series = Vec::with_capacity(self.series_ids().len());
        let mut warnings = vec![];
        for s in self.iter_series() {
            if s.is_empty() {
                tracing::warn!(series_id = %s.id(), "series has no observations");
                warnings.push(DetectWarning::EmptySeries { series_id: s.id() });
                series.push(SeriesIqr::empty(s.id()));
                continue;
            }
            series.push(SeriesIqr::detect(&s, params));
        }

        Ok(IqrReport {
            params: *params,
            series,
            warnings,
        })
    }
}
