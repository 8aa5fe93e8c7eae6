//! Outlier detection over a table of labeled time series.
//!
//! This crate loads a table of observations, partitions it into series by
//! `series_id`, and flags statistical outliers per series with two
//! independent rules.
//!
//! # Overview
//!
//! 1. **Load** ([`dataset::DataSet`]): parse a delimited file into immutable per-series point lists
//! 2. **Detect** with either or both rules:
//!    - [`DataSet::interquartile_range_outliers`]: quantile fences scaled by a whisker multiplier
//!    - [`DataSet::std_dev_outliers`]: z-score thresholding against the series mean and
//!      standard deviation
//! 3. **Inspect** the returned report ([`iqr::IqrReport`], [`zscore::ZScoreReport`]): per-series
//!    fences or normalized values, flagged observations, and warnings
//!
//! Detectors never modify the dataset. Every call validates its parameters
//! first and computes all derived values into the report it returns, so
//! repeated calls with the same parameters produce identical reports and a
//! dataset can be shared between threads.
//!
//! # Examples
//!
//! ```no_run
//! use tsoutlier_analysis::{DataSet, IqrParams, ZScoreParams};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let dataset = DataSet::open("data.csv")?;
//!
//! let iqr = dataset.interquartile_range_outliers(&IqrParams {
//!     top: true,
//!     ..IqrParams::default()
//! })?;
//! for series in &iqr.series {
//!     println!("series {}: {} outliers", series.series_id, series.flagged.len());
//! }
//!
//! let zscore = dataset.std_dev_outliers(&ZScoreParams::default())?;
//! println!("{} z-score outliers", zscore.total_flagged());
//! # Ok(())
//! # }
//! ```

pub use self::{
    dataset::{DataSet, LoadError, Point, Series, SeriesId},
    iqr::{IqrFences, IqrParams, IqrReport, SeriesIqr},
    outlier::{DetectError, DetectWarning, FlaggedPoint, OutlierSide, ParameterError},
    zscore::{DegeneratePolicy, SeriesZScore, ZScoreParams, ZScoreReport},
};

pub mod dataset;
pub mod iqr;
pub mod outlier;
pub mod timestamp;
pub mod zscore;
