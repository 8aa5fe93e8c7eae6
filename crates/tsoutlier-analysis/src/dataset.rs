//! Loading and partitioning of the observation table.
//!
//! A dataset is a delimited text table with a header row and at least the
//! columns `series_id` (integer), `values` (number) and `time_index`
//! (timestamp, see [`timestamp`](crate::timestamp)). Other columns are ignored.
//!
//! ```text
//! series_id,values,time_index
//! 1,0.53,2021-01-01 00:00:00
//! 1,0.61,2021-01-01 01:00:00
//! 2,12.0,2021-01-01 00:00:00
//! ```
//!
//! Rows are partitioned by `series_id` once at load time. Each partition keeps
//! the file order of its rows and is never modified afterwards; detectors
//! compute all derived values into their own containers.

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: [&str; 3] = ["series_id", "values", "time_index"];

/// Identifier of a series, taken verbatim from the `series_id` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct SeriesId(pub i64);

/// A single observation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub time_index: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadError {
    #[display("failed to open dataset file {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("malformed dataset record")]
    Csv { source: csv::Error },
    #[display("dataset is missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[display("non-finite value '{value}' on line {line}")]
    NonFiniteValue { line: u64, value: f64 },
    #[display("unparseable timestamp '{value}' on line {line}")]
    Timestamp { line: u64, value: String },
    #[display("dataset contains no rows")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    series_id: i64,
    values: f64,
    time_index: String,
}

/// A borrowed view of one series.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    id: SeriesId,
    points: &'a [Point],
}

impl<'a> Series<'a> {
    #[must_use]
    pub fn id(&self) -> SeriesId {
        self.id
    }

    #[must_use]
    pub fn points(&self) -> &'a [Point] {
        self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + use<'a> {
        let points = self.points;
        points.iter().map(|p| p.value)
    }

    /// Values of the series sorted in ascending order.
    #[must_use]
    pub fn sorted_values(&self) -> Vec<f64> {
        let mut values = self.values().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Earliest and latest timestamp of the series.
    #[must_use]
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.points.iter().map(|p| p.time_index).min()?;
        let last = self.points.iter().map(|p| p.time_index).max()?;
        Some((first, last))
    }

    /// Smallest and largest value of the series.
    #[must_use]
    pub fn value_span(&self) -> Option<(f64, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let span = self
            .values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Some(span)
    }
}

/// An immutable table of observations partitioned into series.
///
/// # Examples
///
/// ```
/// use tsoutlier_analysis::dataset::{DataSet, SeriesId};
///
/// let csv = "\
/// series_id,values,time_index
/// 2,1.5,2021-01-01
/// 1,0.5,2021-01-01
/// 1,0.7,2021-01-02
/// ";
/// let dataset = DataSet::from_reader(csv.as_bytes()).unwrap();
/// assert_eq!(dataset.num_rows(), 3);
/// assert_eq!(dataset.series_ids(), &[SeriesId(1), SeriesId(2)]);
/// assert_eq!(dataset.series(SeriesId(1)).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DataSet {
    partitions: BTreeMap<SeriesId, Vec<Point>>,
    series_ids: Vec<SeriesId>,
    num_rows: usize,
}

impl DataSet {
    /// Loads a dataset from a delimited text file.
    pub fn open<P>(path: P) -> Result<Self, LoadError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_owned(),
            source,
        })?;
        let dataset = Self::from_reader(io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.display(),
            rows = dataset.num_rows,
            series = dataset.series_ids.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Loads a dataset from any reader producing delimited text with a header row.
    pub fn from_reader<R>(reader: R) -> Result<Self, LoadError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader
            .headers()
            .map_err(|source| LoadError::Csv { source })?
            .clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(LoadError::MissingColumn { column });
            }
        }

        let mut observations = vec![];
        let mut record = csv::StringRecord::new();
        while reader
            .read_record(&mut record)
            .map_err(|source| LoadError::Csv { source })?
        {
            let row: RawRow = record
                .deserialize(Some(&headers))
                .map_err(|source| LoadError::Csv { source })?;
            let line = record.position().map_or(0, csv::Position::line);
            if !row.values.is_finite() {
                return Err(LoadError::NonFiniteValue {
                    line,
                    value: row.values,
                });
            }
            let time_index = timestamp::parse_timestamp(&row.time_index).ok_or_else(|| {
                LoadError::Timestamp {
                    line,
                    value: row.time_index.clone(),
                }
            })?;
            observations.push((
                SeriesId(row.series_id),
                Point {
                    time_index,
                    value: row.values,
                },
            ));
        }

        if observations.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(Self::from_observations(observations))
    }

    /// Builds a dataset from already-parsed observations.
    ///
    /// The analysed series set is the sorted list of distinct ids.
    #[must_use]
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (SeriesId, Point)>,
    {
        let mut partitions = BTreeMap::<SeriesId, Vec<Point>>::new();
        let mut num_rows = 0;
        for (id, point) in observations {
            partitions.entry(id).or_default().push(point);
            num_rows += 1;
        }
        let series_ids = partitions.keys().copied().collect();
        Self {
            partitions,
            series_ids,
            num_rows,
        }
    }

    /// Replaces the analysed series set with an explicit list.
    ///
    /// Ids without rows are kept and analysed as empty series.
    #[must_use]
    pub fn with_series_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = SeriesId>,
    {
        self.series_ids = ids.into_iter().collect();
        self
    }

    /// The series analysed by the detectors, in order.
    #[must_use]
    pub fn series_ids(&self) -> &[SeriesId] {
        &self.series_ids
    }

    /// Returns the series with the given id; unknown ids yield an empty series.
    #[must_use]
    pub fn series(&self, id: SeriesId) -> Series<'_> {
        let points = self.partitions.get(&id).map_or(&[][..], Vec::as_slice);
        Series { id, points }
    }

    /// Iterates over the analysed series in order.
    pub fn iter_series(&self) -> impl Iterator<Item = Series<'_>> + '_ {
        self.series_ids.iter().map(|&id| self.series(id))
    }

    /// Total number of rows loaded, including rows of series not analysed.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} rows, {} series analysed",
            self.num_rows,
            self.series_ids.len()
        )?;
        writeln!(
            f,
            "{:>10} {:>8} {:>14} {:>14}  {}",
            "series_id", "count", "min", "max", "time span"
        )?;
        for series in self.iter_series() {
            let (min, max) = series.value_span().map_or_else(
                || ("-".to_owned(), "-".to_owned()),
                |(lo, hi)| (format!("{lo:.4}"), format!("{hi:.4}")),
            );
            let span = series.time_span().map_or_else(
                || "-".to_owned(),
                |(first, last)| {
                    format!(
                        "{} .. {}",
                        first.format("%Y-%m-%d %H:%M:%S"),
                        last.format("%Y-%m-%d %H:%M:%S")
                    )
                },
            );
            writeln!(
                f,
                "{:>10} {:>8} {min:>14} {max:>14}  {span}",
                series.id().to_string(),
                series.len()
            )?;
        }
        Ok(())
    }
}
