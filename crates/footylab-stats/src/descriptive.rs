/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency and dispersion
/// for a dataset of `f64` values. Non-finite values are ignored when computing
/// the statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    /// Number of finite values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The sum of all values.
    pub sum: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    ///
    /// For an even number of values this is the mean of the two middle values.
    pub median: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one finite value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use footylab_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted finite values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use footylab_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(stats.median, 2.5);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let sum = sorted_values.iter().sum::<f64>();
        let n = count as f64;
        let mean = sum / n;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted_values[mid - 1], sorted_values[mid])
        } else {
            sorted_values[mid]
        };
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            count,
            min,
            max,
            sum,
            mean,
            median,
            variance,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert_eq!(DescriptiveStats::new([]), None);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let stats = DescriptiveStats::new([1.0, f64::NAN, 3.0, f64::INFINITY]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.max, 3.0);
    }

    #[test]
    fn test_only_non_finite_values() {
        assert_eq!(DescriptiveStats::new([f64::NAN, f64::NEG_INFINITY]), None);
    }

    #[test]
    fn test_variance() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.variance, 4.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.median, 4.5);
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.std_dev, 0.0);
    }
}
