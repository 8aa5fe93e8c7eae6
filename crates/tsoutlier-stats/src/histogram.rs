use std::ops::Range;

/// A histogram representation of a dataset's distribution.
///
/// The histogram divides a value range into equal-width bins and counts the
/// frequency of values falling into each bin.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The bins comprising the histogram, in ascending order.
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    ///
    /// The last bin of a histogram also contains values equal to its end.
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram spanning the full range of the values.
    ///
    /// # Arguments
    ///
    /// * `values` - The data points to create the histogram from.
    /// * `num_bins` - The number of equal-width bins to create.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tsoutlier_stats::histogram::Histogram;
    /// let values = [0.0, 0.5, 1.0, 1.5, 2.0];
    /// let histogram = Histogram::new(values, 2);
    /// assert_eq!(histogram.bins[0].range, 0.0..1.0);
    /// assert_eq!(histogram.bins[0].count, 2);
    /// assert_eq!(histogram.bins[1].count, 3);
    /// ```
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if values.is_empty() {
            return Self { bins: vec![] };
        }
        Self::with_range(values, num_bins, min..max)
    }

    /// Creates a histogram spanning an explicit range.
    ///
    /// Values outside `range` are not counted. A degenerate range whose start
    /// equals its end is widened to one unit centered on that value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tsoutlier_stats::histogram::Histogram;
    /// let histogram = Histogram::with_range([-5.0, -0.5, 0.5, 5.0], 4, -2.0..2.0);
    /// assert_eq!(histogram.total_count(), 2);
    /// assert_eq!(histogram.bins[1].range, -1.0..0.0);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn with_range<I>(values: I, num_bins: usize, range: Range<f64>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        if num_bins == 0 || !range.start.is_finite() || !range.end.is_finite() {
            return Self { bins: vec![] };
        }

        let (start, end) = if range.end > range.start {
            (range.start, range.end)
        } else {
            (range.start - 0.5, range.start + 0.5)
        };
        let width = (end - start) / num_bins as f64;

        // Recompute boundaries from the bin index to avoid accumulation errors
        let mut bins = (0..num_bins)
            .map(|idx| {
                let bin_start = start + idx as f64 * width;
                let bin_end = if idx + 1 == num_bins {
                    end
                } else {
                    start + (idx + 1) as f64 * width
                };
                HistogramBin {
                    range: bin_start..bin_end,
                    count: 0,
                }
            })
            .collect::<Vec<_>>();

        for val in values {
            if !(start..=end).contains(&val) {
                continue;
            }
            let idx = (((val - start) / width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Total number of values counted across all bins.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }

    /// The largest count of any bin, or zero for an empty histogram.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).max().unwrap_or(0)
    }

    /// The full value range covered by the histogram.
    #[must_use]
    pub fn range(&self) -> Option<Range<f64>> {
        let first = self.bins.first()?;
        let last = self.bins.last()?;
        Some(first.range.start..last.range.end)
    }
}
