//! Fairness-adjusted metrics
//!
//! Totals are not comparable between players who spent different amounts of
//! time on the pitch. This module scales totals to a 90-minute window and
//! computes success percentages, reporting every input that makes the result
//! meaningless as an [`UndefinedMetric`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    exposure::ExposureTable,
    metric::{MetricValue, UndefinedMetric},
    summary::{Summary, SummaryRow},
};

/// Length of a regulation match, in minutes.
pub const MINUTES_PER_MATCH: f64 = 90.0;

/// Scales `total` to a 90-minute window: `total / exposure * 90`.
///
/// # Errors
///
/// - [`UndefinedMetric::MissingExposure`] if `exposure` is `None`
/// - [`UndefinedMetric::NonFiniteValue`] if `total` or `exposure` is `NaN` or infinite
/// - [`UndefinedMetric::NonPositiveExposure`] if `exposure` is zero or negative
///
/// # Examples
///
/// ```
/// use footylab_pipeline::{metric::UndefinedMetric, normalize::per_90};
///
/// assert_eq!(per_90(9.0, Some(90.0)), Ok(9.0));
/// assert_eq!(per_90(9.0, Some(0.0)), Err(UndefinedMetric::NonPositiveExposure));
/// ```
pub fn per_90(total: f64, exposure: Option<f64>) -> Result<f64, UndefinedMetric> {
    let exposure = exposure.ok_or(UndefinedMetric::MissingExposure)?;
    if !total.is_finite() || !exposure.is_finite() {
        return Err(UndefinedMetric::NonFiniteValue);
    }
    if exposure <= 0.0 {
        return Err(UndefinedMetric::NonPositiveExposure);
    }
    finite(total / exposure * MINUTES_PER_MATCH)
}

/// `numerator / denominator * 100`.
///
/// # Errors
///
/// - [`UndefinedMetric::ZeroDenominator`] if `denominator` is zero
/// - [`UndefinedMetric::NonFiniteValue`] if an input or the result is not finite
pub fn percentage(numerator: f64, denominator: f64) -> Result<f64, UndefinedMetric> {
    if !numerator.is_finite() || !denominator.is_finite() {
        return Err(UndefinedMetric::NonFiniteValue);
    }
    if denominator == 0.0 {
        return Err(UndefinedMetric::ZeroDenominator);
    }
    finite(numerator / denominator * 100.0)
}

fn finite(value: f64) -> Result<f64, UndefinedMetric> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(UndefinedMetric::NonFiniteValue)
    }
}

/// A metric computed from the metrics of an existing summary row.
///
/// Derived metrics are computed in order, and each one may read the metrics
/// derived before it (e.g. the per-90 rate of a sum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedMetric {
    /// `metric` scaled to 90 minutes; named `<metric>_per_90` unless `name` is set
    #[serde(rename = "per_90")]
    Per90 {
        metric: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// `numerator / denominator * 100`
    Percentage {
        numerator: String,
        denominator: String,
        name: String,
    },
    /// Sum of the `of` metrics, undefined if any of them is
    Sum { of: Vec<String>, name: String },
}

impl DerivedMetric {
    #[must_use]
    pub fn per_90(metric: impl Into<String>) -> Self {
        Self::Per90 {
            metric: metric.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn percentage(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self::Percentage {
            numerator: numerator.into(),
            denominator: denominator.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn sum<I, S>(name: impl Into<String>, of: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Sum {
            of: of.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// Name of the metric in the derived summary.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Per90 { metric, name } => name.clone().unwrap_or_else(|| format!("{metric}_per_90")),
            Self::Percentage { name, .. } | Self::Sum { name, .. } => name.clone(),
        }
    }

    /// Metric names of the source summary this metric reads.
    #[must_use]
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Per90 { metric, .. } => vec![metric.as_str()],
            Self::Percentage {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
            Self::Sum { of, .. } => of.iter().map(String::as_str).collect(),
        }
    }

    fn compute(&self, row: &SummaryRow, exposure: Option<f64>) -> MetricValue {
        let result = match self {
            Self::Per90 { metric, .. } => row
                .metric(metric)
                .value()
                .and_then(|total| per_90(total, exposure)),
            Self::Percentage {
                numerator,
                denominator,
                ..
            } => row.metric(numerator).value().and_then(|num| {
                let den = row.metric(denominator).value()?;
                percentage(num, den)
            }),
            Self::Sum { of, .. } => of
                .iter()
                .map(|metric| row.metric(metric).value())
                .sum::<Result<f64, _>>()
                .and_then(finite),
        };
        MetricValue::from(result)
    }
}

/// Builds a new summary holding only the `derived` metrics of every row of `summary`.
///
/// Undefined inputs propagate as undefined outputs with the same reason.
#[must_use]
pub fn derive(summary: &Summary, exposure: &ExposureTable, derived: &[DerivedMetric]) -> Summary {
    let rows = summary.rows().map(|(key, row)| {
        let minutes = exposure.minutes(key);
        let mut inputs = row.clone();
        let mut metrics = BTreeMap::new();
        for metric in derived {
            let value = metric.compute(&inputs, minutes);
            inputs.metrics.insert(metric.name(), value);
            metrics.insert(metric.name(), value);
        }
        let derived_row = SummaryRow {
            label: row.label.clone(),
            records: row.records,
            metrics,
        };
        (key.clone(), derived_row)
    });
    Summary::from_rows(summary.source(), rows)
}

#[cfg(test)]
mod tests {
    use crate::record::EntityKey;

    use super::*;

    #[test]
    fn test_per_90() {
        assert_eq!(per_90(9.0, Some(90.0)), Ok(9.0));
        assert_eq!(per_90(3.0, Some(45.0)), Ok(6.0));
        assert_eq!(per_90(0.0, Some(30.0)), Ok(0.0));
        assert_eq!(per_90(9.0, Some(0.0)), Err(UndefinedMetric::NonPositiveExposure));
        assert_eq!(per_90(9.0, Some(-10.0)), Err(UndefinedMetric::NonPositiveExposure));
        assert_eq!(per_90(9.0, None), Err(UndefinedMetric::MissingExposure));
        assert_eq!(per_90(9.0, Some(f64::NAN)), Err(UndefinedMetric::NonFiniteValue));
        assert_eq!(per_90(f64::INFINITY, Some(90.0)), Err(UndefinedMetric::NonFiniteValue));
        assert_eq!(per_90(1.0, Some(f64::MIN_POSITIVE)), Err(UndefinedMetric::NonFiniteValue));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3.0, 4.0), Ok(75.0));
        assert_eq!(percentage(0.0, 0.0), Err(UndefinedMetric::ZeroDenominator));
        assert_eq!(percentage(f64::NAN, 1.0), Err(UndefinedMetric::NonFiniteValue));
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(DerivedMetric::per_90("goals").name(), "goals_per_90");
        let renamed = DerivedMetric::Per90 {
            metric: "xg".to_owned(),
            name: Some("npxg90".to_owned()),
        };
        assert_eq!(renamed.name(), "npxg90");
        assert_eq!(
            DerivedMetric::percentage("conv", "goals", "shots").inputs(),
            ["goals", "shots"]
        );
    }

    #[test]
    fn test_derive_propagates_undefined() {
        let summary = Summary::from_rows(
            "t",
            [
                (
                    EntityKey::from("A"),
                    SummaryRow::new("A", 2)
                        .with_metric("goals", MetricValue::Defined(1.0))
                        .with_metric("shots", MetricValue::Defined(4.0)),
                ),
                (
                    EntityKey::from("B"),
                    SummaryRow::new("B", 0)
                        .with_metric("goals", MetricValue::Defined(0.0))
                        .with_metric("shots", MetricValue::Defined(0.0)),
                ),
            ],
        );
        let exposure = [("A", 180.0)].into_iter().collect::<ExposureTable>();
        let derived = derive(
            &summary,
            &exposure,
            &[
                DerivedMetric::per_90("goals"),
                DerivedMetric::percentage("conversion_pct", "goals", "shots"),
                DerivedMetric::per_90("assists"),
            ],
        );
        let a = EntityKey::from("A");
        let b = EntityKey::from("B");
        assert_eq!(derived.get(&a, "goals_per_90"), MetricValue::Defined(0.5));
        assert_eq!(derived.get(&a, "conversion_pct"), MetricValue::Defined(25.0));
        assert_eq!(
            derived.get(&a, "assists_per_90"),
            MetricValue::Undefined(UndefinedMetric::MissingMetric)
        );
        assert_eq!(
            derived.get(&b, "goals_per_90"),
            MetricValue::Undefined(UndefinedMetric::MissingExposure)
        );
        assert_eq!(
            derived.get(&b, "conversion_pct"),
            MetricValue::Undefined(UndefinedMetric::ZeroDenominator)
        );
        assert_eq!(derived.metric_names().len(), 3);
    }

    #[test]
    fn test_profile_json_shape() {
        let metric: DerivedMetric =
            serde_json::from_str(r#"{"kind": "per_90", "metric": "shots"}"#).unwrap();
        assert_eq!(metric, DerivedMetric::per_90("shots"));
        assert_eq!(
            serde_json::to_string(&DerivedMetric::per_90("shots")).unwrap(),
            r#"{"kind":"per_90","metric":"shots"}"#
        );
        let metric: DerivedMetric =
            serde_json::from_str(r#"{"kind": "sum", "of": ["xg", "xa"], "name": "xg_plus_xa"}"#)
                .unwrap();
        assert_eq!(metric, DerivedMetric::sum("xg_plus_xa", ["xg", "xa"]));
    }

    #[test]
    fn test_sum_then_per_90() {
        let summary = Summary::from_rows(
            "t",
            [
                (
                    EntityKey::from("A"),
                    SummaryRow::new("A", 3)
                        .with_metric("xg", MetricValue::Defined(0.75))
                        .with_metric("xa", MetricValue::Defined(0.25)),
                ),
                (
                    EntityKey::from("B"),
                    SummaryRow::new("B", 1)
                        .with_metric("xg", MetricValue::Defined(0.5))
                        .with_metric("xa", MetricValue::Undefined(UndefinedMetric::EmptyGroup)),
                ),
            ],
        );
        let exposure = [("A", 45.0), ("B", 90.0)].into_iter().collect::<ExposureTable>();
        let derived = derive(
            &summary,
            &exposure,
            &[
                DerivedMetric::sum("xg_plus_xa", ["xg", "xa"]),
                DerivedMetric::per_90("xg_plus_xa"),
            ],
        );
        let a = EntityKey::from("A");
        let b = EntityKey::from("B");
        assert_eq!(derived.get(&a, "xg_plus_xa"), MetricValue::Defined(1.0));
        assert_eq!(derived.get(&a, "xg_plus_xa_per_90"), MetricValue::Defined(2.0));
        assert_eq!(
            derived.get(&b, "xg_plus_xa"),
            MetricValue::Undefined(UndefinedMetric::EmptyGroup)
        );
        assert_eq!(
            derived.get(&b, "xg_plus_xa_per_90"),
            MetricValue::Undefined(UndefinedMetric::EmptyGroup)
        );
        assert_eq!(derived.get(&a, "xg"), MetricValue::Undefined(UndefinedMetric::MissingMetric));
    }
}
