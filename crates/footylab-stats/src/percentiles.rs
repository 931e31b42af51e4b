/// Precomputed percentile values for a dataset.
///
/// This structure stores percentile-value pairs for efficient lookup
/// of commonly used percentile points.
///
/// # Examples
///
/// ```
/// use footylab_stats::percentiles::Percentiles;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
///
/// assert_eq!(percentiles.get(50.0), Some(6.0));
/// assert_eq!(percentiles.get(25.0), Some(3.0));
/// ```
#[derive(Debug, Clone)]
pub struct Percentiles {
    /// Percentile-value pairs in the order they were requested.
    /// Each tuple contains (percentile, value) where percentile is 0.0-100.0.
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes percentiles from sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = percentile_points
            .iter()
            .map(|&p| (p, compute_percentile(sorted_values, p)))
            .collect();
        Self { values }
    }

    /// Computes percentiles from unsorted values.
    ///
    /// Non-finite values are dropped before sorting.
    ///
    /// # Examples
    ///
    /// ```
    /// use footylab_stats::percentiles::Percentiles;
    ///
    /// let values = vec![5.0, 2.0, 8.0, 1.0, 9.0];
    /// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(5.0));
    /// ```
    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// Gets the value at a specific percentile.
    ///
    /// Returns `None` if the percentile was not precomputed or the dataset was empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use footylab_stats::percentiles::Percentiles;
    ///
    /// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    /// let percentiles = Percentiles::new(&values, &[50.0, 95.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(3.0));
    /// assert_eq!(percentiles.get(95.0), Some(5.0));
    /// assert_eq!(percentiles.get(25.0), None); // Not precomputed
    /// ```
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.values.iter().find_map(|(p, value)| {
            ((*p - percentile).abs() < f64::EPSILON && !value.is_nan()).then_some(*value)
        })
    }

    /// Returns an iterator over all (percentile, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }
}

/// Computes a single percentile value from sorted data.
///
/// This function uses the nearest-rank method: for a dataset with n values,
/// the k-th percentile is the value at position `floor(n * k / 100)`.
///
/// Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use footylab_stats::percentiles::compute_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(compute_percentile(&values, 50.0), 3.0);
/// assert_eq!(compute_percentile(&values, 25.0), 2.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let idx = ((sorted_values.len() as f64 * percentile) / 100.0) as usize;
    let idx = idx.min(sorted_values.len() - 1);
    sorted_values[idx]
}

/// Computes the percentile rank of `score` relative to `population`.
///
/// Uses the "rank" convention: the average of the percentage of values
/// strictly below the score and the percentage of values at or below it, with
/// ties counted once more when the score is present in the population. This
/// matches the behaviour scouting reports expect from radar charts, where a
/// player equal to the population maximum lands close to (but not always at)
/// the 100th percentile.
///
/// Non-finite population values are ignored.
///
/// # Returns
///
/// * `Some(rank)` with `0.0 <= rank <= 100.0`
/// * `None` if the population has no finite values or `score` is not finite
///
/// # Examples
///
/// ```
/// use footylab_stats::percentiles::percentile_of_score;
///
/// assert_eq!(percentile_of_score(&[1.0, 2.0, 3.0, 4.0], 3.0), Some(75.0));
/// assert_eq!(percentile_of_score(&[1.0, 2.0, 3.0, 3.0, 4.0], 3.0), Some(70.0));
/// assert_eq!(percentile_of_score(&[], 3.0), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn percentile_of_score(population: &[f64], score: f64) -> Option<f64> {
    if !score.is_finite() {
        return None;
    }
    let mut n = 0_usize;
    let mut below = 0_usize;
    let mut at_or_below = 0_usize;
    for value in population.iter().copied().filter(|v| v.is_finite()) {
        n += 1;
        if value < score {
            below += 1;
        }
        if value <= score {
            at_or_below += 1;
        }
    }
    if n == 0 {
        return None;
    }
    let tie_bonus = usize::from(at_or_below > below);
    Some((below + at_or_below + tie_bonus) as f64 * 50.0 / n as f64)
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_percentile_of_score_extremes() {
        let population = [10.0, 20.0, 30.0];
        assert_eq!(percentile_of_score(&population, 0.0), Some(0.0));
        assert_eq!(percentile_of_score(&population, 100.0), Some(100.0));
    }

    #[test]
    fn test_percentile_of_score_ignores_nan() {
        let population = [1.0, f64::NAN, 2.0, 3.0, 4.0];
        assert_eq!(percentile_of_score(&population, 3.0), Some(75.0));
        assert_eq!(percentile_of_score(&population, f64::NAN), None);
    }

    #[test]
    fn test_percentile_of_score_bounded_and_monotonic() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        for _ in 0..200 {
            let len = rng.random_range(1..50);
            let population = (0..len)
                .map(|_| rng.random_range(0.0..10.0))
                .collect::<Vec<f64>>();
            let a = rng.random_range(-1.0..11.0);
            let b = rng.random_range(-1.0..11.0);
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let rank_low = percentile_of_score(&population, low).unwrap();
            let rank_high = percentile_of_score(&population, high).unwrap();
            assert!((0.0..=100.0).contains(&rank_low));
            assert!((0.0..=100.0).contains(&rank_high));
            assert!(rank_low <= rank_high);
        }
    }

    #[test]
    fn test_percentiles_of_empty_dataset() {
        let percentiles = Percentiles::new(&[], &[50.0]);
        assert_eq!(percentiles.get(50.0), None);
    }
}
