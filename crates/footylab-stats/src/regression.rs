/// Ordinary least-squares fit of `y = slope * x + intercept`.
///
/// Used to answer questions such as "how many more goals does a player score
/// per extra dollar of salary".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Change of `y` per unit of `x`.
    pub slope: f64,
    /// Value of `y` at `x = 0`.
    pub intercept: f64,
    /// Coefficient of determination (`1.0` for a perfect fit).
    ///
    /// `None` when all `y` values are equal, which leaves the ratio undefined.
    pub r_squared: Option<f64>,
    /// Number of points the line was fitted to.
    pub count: usize,
}

impl LinearFit {
    /// Fits a line through `(x, y)` points.
    ///
    /// Points with a non-finite coordinate are skipped.
    ///
    /// # Returns
    ///
    /// * `Some(LinearFit)` - if at least two points with distinct `x` remain
    /// * `None` - otherwise (the slope would be undefined)
    ///
    /// # Examples
    ///
    /// ```
    /// use footylab_stats::regression::LinearFit;
    ///
    /// let fit = LinearFit::least_squares(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]).unwrap();
    /// assert_eq!(fit.slope, 2.0);
    /// assert_eq!(fit.intercept, 0.0);
    /// assert_eq!(fit.r_squared, Some(1.0));
    ///
    /// assert!(LinearFit::least_squares(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn least_squares(points: &[(f64, f64)]) -> Option<Self> {
        let points = points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect::<Vec<_>>();
        let count = points.len();
        if count < 2 {
            return None;
        }
        let n = count as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in &points {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r_squared = (syy > 0.0).then(|| (sxy * sxy) / (sxx * syy));

        Some(Self {
            slope,
            intercept,
            r_squared,
            count,
        })
    }

    /// Predicts `y` for the given `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_points() {
        assert!(LinearFit::least_squares(&[]).is_none());
        assert!(LinearFit::least_squares(&[(1.0, 1.0)]).is_none());
    }

    #[test]
    fn test_non_finite_points_are_skipped() {
        let fit =
            LinearFit::least_squares(&[(0.0, 1.0), (f64::NAN, 9.0), (1.0, 2.0), (2.0, 3.0)])
                .unwrap();
        assert_eq!(fit.count, 3);
        assert_eq!(fit.slope, 1.0);
        assert_eq!(fit.predict(10.0), 11.0);
    }

    #[test]
    fn test_flat_response() {
        let fit = LinearFit::least_squares(&[(0.0, 5.0), (1.0, 5.0), (2.0, 5.0)]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 5.0);
        assert_eq!(fit.r_squared, None);
    }

    #[test]
    fn test_noisy_fit() {
        let fit = LinearFit::least_squares(&[(0.0, 0.0), (1.0, 2.0), (2.0, 1.0), (3.0, 3.0)])
            .unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 0.3).abs() < 1e-12);
        let r2 = fit.r_squared.unwrap();
        assert!(r2 > 0.0 && r2 < 1.0);
    }
}
