//! Numeric kernels for time-series outlier detection.
//!
//! This crate provides the small set of statistics the detectors are built on:
//!
//! - **Descriptive statistics**: min, max, mean, median, population variance and standard deviation
//! - **Quantiles**: empirical quantiles with linear interpolation between closest ranks
//! - **Histogram generation**: equal-width frequency distributions
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing a series
//! - [`quantiles`]: Quantile computation and storage
//! - [`histogram`]: Histogram construction for visualizing distributions
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use tsoutlier_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert!((stats.std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
//! ```
//!
//! ## Computing quantiles
//!
//! ```
//! use tsoutlier_stats::quantiles::Quantiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
//! let quantiles = Quantiles::new(&values, &[0.25, 0.75]);
//! assert_eq!(quantiles.get(0.25), Some(2.25));
//! assert_eq!(quantiles.get(0.75), Some(4.75));
//! ```
//!
//! ## Creating a histogram
//!
//! ```
//! use tsoutlier_stats::histogram::Histogram;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
//! let histogram = Histogram::new(values, 5);
//! assert_eq!(histogram.bins.len(), 5);
//! assert_eq!(histogram.total_count(), 10);
//! ```

pub mod descriptive;
pub mod histogram;
pub mod quantiles;
