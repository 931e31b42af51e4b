//! Per-entity metric tables
//!
//! A [`Summary`] maps group keys (players, teams, ages, ...) to a row of named
//! [`MetricValue`]s. Summaries are produced by the aggregation stage and never
//! modified afterwards; every transformation (normalization, selection,
//! ranking) builds a new summary.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

use serde::{Deserialize, Serialize};

use crate::{
    metric::{MetricValue, UndefinedMetric},
    record::EntityKey,
};

/// Metrics computed for one group key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Human-readable label (player name, team name, ...)
    pub label: String,
    /// Number of records that fed this row
    pub records: usize,
    pub metrics: BTreeMap<String, MetricValue>,
}

impl SummaryRow {
    #[must_use]
    pub fn new(label: impl Into<String>, records: usize) -> Self {
        Self {
            label: label.into(),
            records,
            metrics: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: MetricValue) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Value of `name`, or [`UndefinedMetric::MissingMetric`] if the row has no such metric.
    #[must_use]
    pub fn metric(&self, name: &str) -> MetricValue {
        self.metrics
            .get(name)
            .copied()
            .unwrap_or(MetricValue::Undefined(UndefinedMetric::MissingMetric))
    }
}

/// One row per group key, tagged with the data source it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    source: String,
    rows: BTreeMap<EntityKey, SummaryRow>,
}

impl Summary {
    #[must_use]
    pub fn from_rows<I>(source: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = (EntityKey, SummaryRow)>,
    {
        Self {
            source: source.into(),
            rows: rows.into_iter().collect(),
        }
    }

    /// Label of the data source the summary was computed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&EntityKey, &SummaryRow)> {
        self.rows.iter()
    }

    #[must_use]
    pub fn row(&self, key: &EntityKey) -> Option<&SummaryRow> {
        self.rows.get(key)
    }

    /// Value of `metric` for `key`.
    ///
    /// Missing rows and missing metrics are reported as [`UndefinedMetric::MissingMetric`].
    #[must_use]
    pub fn get(&self, key: &EntityKey, metric: &str) -> MetricValue {
        self.rows.get(key).map_or(
            MetricValue::Undefined(UndefinedMetric::MissingMetric),
            |row| row.metric(metric),
        )
    }

    /// Union of metric names over all rows.
    #[must_use]
    pub fn metric_names(&self) -> BTreeSet<&str> {
        self.rows
            .values()
            .flat_map(|row| row.metrics.keys().map(String::as_str))
            .collect()
    }

    /// Keeps only the named metrics, dropping the rest.
    #[must_use]
    pub fn select(&self, metrics: &[&str]) -> Summary {
        let rows = self.rows.iter().map(|(key, row)| {
            let metrics = row
                .metrics
                .iter()
                .filter(|(name, _)| metrics.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), *value))
                .collect();
            let row = SummaryRow {
                label: row.label.clone(),
                records: row.records,
                metrics,
            };
            (key.clone(), row)
        });
        Summary::from_rows(self.source.clone(), rows)
    }

    /// Column-joins two summaries over the same key space.
    ///
    /// Keys present in either summary are kept. When both rows carry a metric
    /// with the same name, the value from `self` wins.
    #[must_use]
    pub fn merge_metrics(&self, other: &Summary) -> Summary {
        let mut rows = self.rows.clone();
        for (key, other_row) in &other.rows {
            let row = rows
                .entry(key.clone())
                .or_insert_with(|| SummaryRow::new(other_row.label.clone(), other_row.records));
            for (name, value) in &other_row.metrics {
                row.metrics.entry(name.clone()).or_insert(*value);
            }
        }
        Summary::from_rows(self.source.clone(), rows)
    }

    /// Sums rows into coarser groups (players into teams, for instance).
    ///
    /// `group_of` maps each row to its new key and label; rows mapped to
    /// `None` are left out. Metric values are summed per group, and an
    /// undefined member makes the group value undefined with the same reason.
    #[must_use]
    pub fn regroup<F>(&self, mut group_of: F) -> Summary
    where
        F: FnMut(&EntityKey, &SummaryRow) -> Option<(EntityKey, String)>,
    {
        let mut rows = BTreeMap::<EntityKey, SummaryRow>::new();
        for (key, row) in &self.rows {
            let Some((group, label)) = group_of(key, row) else {
                continue;
            };
            let target = rows
                .entry(group)
                .or_insert_with(|| SummaryRow::new(label, 0));
            target.records += row.records;
            for (name, value) in &row.metrics {
                let sum = match (target.metrics.get(name).copied(), *value) {
                    (None, value) => value,
                    (Some(MetricValue::Defined(acc)), MetricValue::Defined(v)) => {
                        MetricValue::new(acc + v)
                    }
                    (Some(undefined @ MetricValue::Undefined(_)), _)
                    | (Some(_), undefined @ MetricValue::Undefined(_)) => undefined,
                };
                target.metrics.insert(name.clone(), sum);
            }
        }
        Summary::from_rows(self.source.clone(), rows)
    }

    /// Rows ordered by `metric`, highest first.
    ///
    /// Undefined values sort last; ties are broken by key.
    #[must_use]
    pub fn rank_by(&self, metric: &str) -> Vec<(&EntityKey, &SummaryRow)> {
        let mut ranked = self.rows.iter().collect::<Vec<_>>();
        ranked.sort_by(|(ka, ra), (kb, rb)| {
            match (ra.metric(metric).as_defined(), rb.metric(metric).as_defined()) {
                (Some(a), Some(b)) => b.total_cmp(&a),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| ka.cmp(kb))
        });
        ranked
    }

    /// The `n` highest rows by `metric`, undefined values excluded.
    #[must_use]
    pub fn top(&self, metric: &str, n: usize) -> Vec<(&EntityKey, &SummaryRow)> {
        self.rank_by(metric)
            .into_iter()
            .filter(|(_, row)| row.metric(metric).is_defined())
            .take(n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary::from_rows(
            "test",
            [
                (
                    EntityKey::from("a"),
                    SummaryRow::new("A", 3).with_metric("goals", MetricValue::Defined(1.0)),
                ),
                (
                    EntityKey::from("b"),
                    SummaryRow::new("B", 5)
                        .with_metric("goals", MetricValue::Defined(4.0))
                        .with_metric("xg", MetricValue::Defined(2.5)),
                ),
                (
                    EntityKey::from("c"),
                    SummaryRow::new("C", 0)
                        .with_metric("goals", MetricValue::Undefined(UndefinedMetric::EmptyGroup)),
                ),
            ],
        )
    }

    #[test]
    fn test_rank_puts_undefined_last() {
        let summary = summary();
        let order = summary
            .rank_by("goals")
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, ["b", "a", "c"]);
        assert_eq!(summary.top("goals", 10).len(), 2);
        assert_eq!(summary.top("goals", 1)[0].1.label, "B");
    }

    #[test]
    fn test_missing_metric_is_undefined() {
        let summary = summary();
        assert_eq!(
            summary.get(&EntityKey::from("a"), "xg"),
            MetricValue::Undefined(UndefinedMetric::MissingMetric)
        );
        assert_eq!(
            summary.get(&EntityKey::from("zzz"), "goals"),
            MetricValue::Undefined(UndefinedMetric::MissingMetric)
        );
    }

    #[test]
    fn test_metric_names_and_select() {
        let summary = summary();
        assert_eq!(summary.metric_names(), BTreeSet::from(["goals", "xg"]));
        let selected = summary.select(&["xg"]);
        assert_eq!(selected.metric_names(), BTreeSet::from(["xg"]));
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_regroup_sums_and_propagates_undefined() {
        let summary = summary();
        let team = summary.regroup(|key, _| {
            let team = if key.as_str() == "c" { "y" } else { "x" };
            Some((EntityKey::from(team), team.to_uppercase()))
        });
        assert_eq!(team.len(), 2);
        assert_eq!(team.get(&EntityKey::from("x"), "goals"), MetricValue::Defined(5.0));
        assert_eq!(team.get(&EntityKey::from("x"), "xg"), MetricValue::Defined(2.5));
        assert_eq!(team.row(&EntityKey::from("x")).unwrap().records, 8);
        assert_eq!(
            team.get(&EntityKey::from("y"), "goals"),
            MetricValue::Undefined(UndefinedMetric::EmptyGroup)
        );
    }

    #[test]
    fn test_merge_metrics_prefers_self() {
        let left = summary();
        let right = Summary::from_rows(
            "other",
            [
                (
                    EntityKey::from("a"),
                    SummaryRow::new("A", 3)
                        .with_metric("goals", MetricValue::Defined(99.0))
                        .with_metric("minutes", MetricValue::Defined(90.0)),
                ),
                (
                    EntityKey::from("d"),
                    SummaryRow::new("D", 1).with_metric("minutes", MetricValue::Defined(10.0)),
                ),
            ],
        );
        let merged = left.merge_metrics(&right);
        assert_eq!(merged.source(), "test");
        assert_eq!(merged.len(), 4);
        assert_eq!(
            merged.get(&EntityKey::from("a"), "goals"),
            MetricValue::Defined(1.0)
        );
        assert_eq!(
            merged.get(&EntityKey::from("a"), "minutes"),
            MetricValue::Defined(90.0)
        );
    }
}
