//! Metric values that can be undefined
//!
//! Every number the pipeline derives is wrapped in a [`MetricValue`]. A value
//! that cannot be computed honestly (an average over nothing, a per-90 rate
//! without minutes) is carried as [`MetricValue::Undefined`] with the reason,
//! so it can never be plotted as `0`, `NaN` or infinity by accident.

use serde::{Deserialize, Serialize};

/// Reason a metric could not be computed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Error,
)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedMetric {
    /// Mean, max or min requested over a group with no values
    #[display("no values to reduce")]
    EmptyGroup,
    /// Exposure (minutes played) is not known for the entity
    #[display("exposure is missing")]
    MissingExposure,
    /// Exposure is zero or negative
    #[display("exposure is not positive")]
    NonPositiveExposure,
    /// An input or the result is `NaN` or infinite
    #[display("value is not finite")]
    NonFiniteValue,
    /// A ratio was requested with a zero denominator
    #[display("denominator is zero")]
    ZeroDenominator,
    /// The summary row has no metric with the requested name
    #[display("metric is missing")]
    MissingMetric,
    /// A rank was requested against a population with no defined values
    #[display("population is empty")]
    EmptyPopulation,
}

/// A derived number, or the reason it is undefined.
///
/// # Examples
///
/// ```
/// use footylab_pipeline::metric::{MetricValue, UndefinedMetric};
///
/// assert_eq!(MetricValue::new(2.0).value(), Ok(2.0));
/// assert_eq!(
///     MetricValue::new(f64::INFINITY),
///     MetricValue::Undefined(UndefinedMetric::NonFiniteValue)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Defined(f64),
    Undefined(UndefinedMetric),
}

impl MetricValue {
    /// Wraps a number, turning non-finite values into [`UndefinedMetric::NonFiniteValue`].
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self::Defined(value)
        } else {
            Self::Undefined(UndefinedMetric::NonFiniteValue)
        }
    }

    /// Returns the number, or the reason it is undefined.
    pub fn value(self) -> Result<f64, UndefinedMetric> {
        match self {
            Self::Defined(value) => Ok(value),
            Self::Undefined(reason) => Err(reason),
        }
    }

    #[must_use]
    pub fn as_defined(self) -> Option<f64> {
        self.value().ok()
    }
}

impl From<Result<f64, UndefinedMetric>> for MetricValue {
    fn from(result: Result<f64, UndefinedMetric>) -> Self {
        match result {
            Ok(value) => Self::new(value),
            Err(reason) => Self::Undefined(reason),
        }
    }
}
