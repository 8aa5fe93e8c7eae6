//! Types shared by the outlier detectors.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dataset::{Point, SeriesId};

/// Which side of the normal range a flagged observation lies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum OutlierSide {
    #[display("low")]
    Low,
    #[display("high")]
    High,
}

/// An observation classified as an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlaggedPoint {
    /// Position of the observation within its series.
    pub index: usize,
    pub time_index: DateTime<Utc>,
    pub value: f64,
    pub side: OutlierSide,
}

impl FlaggedPoint {
    pub(crate) fn new(index: usize, point: &Point, side: OutlierSide) -> Self {
        Self {
            index,
            time_index: point.time_index,
            value: point.value,
            side,
        }
    }
}

/// Non-fatal conditions encountered while running a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectWarning {
    #[display("series {series_id} has no observations")]
    EmptySeries { series_id: SeriesId },
    #[display("series {series_id} is constant; z-score normalization skipped")]
    DegenerateSeries { series_id: SeriesId },
}

/// Detector parameters outside their valid domain.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ParameterError {
    #[display("quantile {name}={value} must lie strictly between 0 and 1")]
    QuantileOutOfRange { name: &'static str, value: f64 },
    #[display("upper quantile Q3={q3} must be greater than lower quantile Q1={q1}")]
    QuantileOrder { q1: f64, q3: f64 },
    #[display("whisker multiplier must be positive and finite, got {whis}")]
    NonPositiveWhisker { whis: f64 },
    #[display("deviation threshold must be positive and finite, got {std}")]
    NonPositiveThreshold { std: f64 },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DetectError {
    #[display("invalid detector parameters: {_0}")]
    Parameter(ParameterError),
    #[display("series {series_id} has zero standard deviation")]
    DegenerateSeries { series_id: SeriesId },
}

impl From<ParameterError> for DetectError {
    fn from(err: ParameterError) -> Self {
        Self::Parameter(err)
    }
}

pub(crate) fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DetectError::from(ParameterError::QuantileOrder { q1: 0.8, q3: 0.2 });
        assert_eq!(
            err.to_string(),
            "invalid detector parameters: upper quantile Q3=0.2 must be greater than lower quantile Q1=0.8"
        );
        let err = DetectError::DegenerateSeries {
            series_id: SeriesId(4),
        };
        assert_eq!(err.to_string(), "series 4 has zero standard deviation");
    }

    #[test]
    fn test_positive_finite() {
        assert!(is_positive_finite(0.1));
        assert!(!is_positive_finite(0.0));
        assert!(!is_positive_finite(-1.0));
        assert!(!is_positive_finite(f64::NAN));
        assert!(!is_positive_finite(f64::INFINITY));
    }
}
