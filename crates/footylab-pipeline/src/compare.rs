//! Side-by-side comparison of two summaries
//!
//! Two summaries computed independently (different datasets, different
//! entity id spaces) are aligned by metric name only and flattened into one
//! long table suitable for a charting tool: one [`ComparisonRow`] per side,
//! entity and shared metric.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{metric::MetricValue, record::EntityKey, summary::Summary};

/// The two summaries share no metric name.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("summaries '{left}' and '{right}' share no metric names")]
pub struct IncompatibleComparison {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[display("left")]
    Left,
    #[display("right")]
    Right,
}

/// One `(source, entity, metric, value)` entry of the long table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub side: Side,
    pub source: String,
    pub entity: EntityKey,
    pub label: String,
    pub metric: String,
    pub value: MetricValue,
}

/// Long ("melted") table of the metrics two summaries share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    metrics: Vec<String>,
    rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// Shared metric names, sorted.
    #[must_use]
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// All rows, grouped by metric, left side before right side.
    #[must_use]
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    pub fn for_metric<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = &'a ComparisonRow> {
        self.rows.iter().filter(move |row| row.metric == metric)
    }
}

/// Merges two summaries into one long table over their shared metric names.
///
/// Entity keys are never matched across sides: an entity `1` on the left and
/// an entity `1` on the right produce two separate rows.
///
/// # Errors
///
/// Returns [`IncompatibleComparison`] if the summaries have no metric name in common.
///
/// # Examples
///
/// ```
/// use footylab_pipeline::{
///     compare::compare,
///     metric::MetricValue,
///     record::EntityKey,
///     summary::{Summary, SummaryRow},
/// };
///
/// let row = |v| SummaryRow::new("p", 1).with_metric("goals_per_90", MetricValue::Defined(v));
/// let left = Summary::from_rows("la_liga", [(EntityKey::from(1), row(0.9))]);
/// let right = Summary::from_rows("ligue_1", [(EntityKey::from(1), row(0.7))]);
///
/// let comparison = compare(&left, &right)?;
/// assert_eq!(comparison.rows().len(), 2);
/// # Ok::<(), footylab_pipeline::compare::IncompatibleComparison>(())
/// ```
pub fn compare(left: &Summary, right: &Summary) -> Result<Comparison, IncompatibleComparison> {
    let shared = left
        .metric_names()
        .intersection(&right.metric_names())
        .map(|name| (*name).to_owned())
        .collect::<BTreeSet<_>>();
    if shared.is_empty() {
        return Err(IncompatibleComparison {
            left: left.source().to_owned(),
            right: right.source().to_owned(),
        });
    }

    let mut rows = Vec::new();
    for metric in &shared {
        for (side, summary) in [(Side::Left, left), (Side::Right, right)] {
            rows.extend(summary.rows().map(|(key, row)| ComparisonRow {
                side,
                source: summary.source().to_owned(),
                entity: key.clone(),
                label: row.label.clone(),
                metric: metric.clone(),
                value: row.metric(metric),
            }));
        }
    }

    Ok(Comparison {
        metrics: shared.into_iter().collect(),
        rows,
    })
}
