/// Precomputed quantile values for a dataset.
///
/// This structure stores probability-value pairs for efficient lookup
/// of the quantile points a detector needs.
///
/// # Examples
///
/// ```
/// use tsoutlier_stats::quantiles::Quantiles;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let quantiles = Quantiles::new(&values, &[0.25, 0.5, 0.75]);
///
/// assert_eq!(quantiles.get(0.5), Some(5.5));
/// assert_eq!(quantiles.get(0.25), Some(3.25));
/// ```
#[derive(Debug, Clone)]
pub struct Quantiles {
    /// Probability-value pairs in the order they were requested.
    /// Each tuple contains (probability, value) where probability is 0.0-1.0.
    values: Vec<(f64, f64)>,
}

impl Quantiles {
    /// Computes quantiles from sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tsoutlier_stats::quantiles::Quantiles;
    ///
    /// let mut values = vec![5.0, 2.0, 8.0, 1.0, 9.0];
    /// values.sort_by(f64::total_cmp);
    /// let quantiles = Quantiles::from_sorted(&values, &[0.5, 0.9]);
    /// assert_eq!(quantiles.get(0.5), Some(5.0));
    /// ```
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], probabilities: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a.total_cmp(b).is_le()),
            "values must be sorted in ascending order"
        );

        let values = probabilities
            .iter()
            .map(|&q| (q, compute_quantile(sorted_values, q)))
            .collect();
        Self { values }
    }

    /// Computes quantiles from unsorted values.
    ///
    /// This method will sort a copy of the values before computing quantiles.
    #[must_use]
    pub fn new(values: &[f64], probabilities: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, probabilities)
    }

    /// Gets the value at a specific probability.
    ///
    /// Returns `None` if the probability was not precomputed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tsoutlier_stats::quantiles::Quantiles;
    ///
    /// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    /// let quantiles = Quantiles::new(&values, &[0.5, 0.95]);
    ///
    /// assert_eq!(quantiles.get(0.5), Some(3.0));
    /// assert_eq!(quantiles.get(0.25), None); // Not precomputed
    /// ```
    #[must_use]
    pub fn get(&self, probability: f64) -> Option<f64> {
        self.values.iter().find_map(|(q, value)| {
            if (*q - probability).abs() < f64::EPSILON {
                Some(*value)
            } else {
                None
            }
        })
    }

    /// Returns an iterator over all (probability, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }

    /// Returns all probability-value pairs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[(f64, f64)] {
        &self.values
    }
}

/// Computes a single empirical quantile from sorted data.
///
/// Uses linear interpolation between the two closest ranks: for `n` values
/// the position is `h = (n - 1) * q` and the result is
/// `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
/// This is the conventional default of most data-analysis toolkits.
///
/// `q` is clamped into `[0, 1]`. Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use tsoutlier_stats::quantiles::compute_quantile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_quantile(&values, 0.5), 3.0);
/// assert_eq!(compute_quantile(&values, 0.25), 2.0);
/// assert_eq!(compute_quantile(&values, 0.875), 4.5);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_quantile(sorted_values: &[f64], q: f64) -> f64 {
    let Some(&last) = sorted_values.last() else {
        return f64::NAN;
    };
    let q = q.clamp(0.0, 1.0);
    let h = (sorted_values.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    if lo + 1 >= sorted_values.len() {
        return last;
    }
    let frac = h - h.floor();
    let lower = sorted_values[lo];
    let upper = sorted_values[lo + 1];
    lower + frac * (upper - lower)
}
