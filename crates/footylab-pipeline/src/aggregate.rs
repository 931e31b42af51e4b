//! Grouping and reduction of records into summaries
//!
//! An [`Aggregation`] groups records by a [`GroupBy`] key and reduces each
//! group with a list of [`MetricSpec`]s. Each metric spec names a measure (or
//! counts records), a [`Reduction`], and an optional [`Predicate`] restricting
//! which records of the group feed it.
//!
//! # Workflow
//!
//! ```text
//! records ──► GroupBy::key ──► per-group Accumulator (one per metric) ──► Summary
//!                                    ▲
//!                      explicit subjects get an empty group
//! ```
//!
//! # Empty groups
//!
//! An explicit subject with no records still gets a row. Its `sum` and `count`
//! metrics are `0`, while `mean`, `max` and `min` are
//! [`UndefinedMetric::EmptyGroup`](crate::metric::UndefinedMetric::EmptyGroup).
//!
//! # Examples
//!
//! ```
//! use footylab_pipeline::{
//!     aggregate::{Aggregation, GroupBy, MetricSpec},
//!     filter::Predicate,
//!     metric::MetricValue,
//!     record::{EntityKey, Record},
//! };
//!
//! let records = [
//!     Record::new("A", "Shot").with_outcome("Goal"),
//!     Record::new("A", "Shot").with_outcome("Miss"),
//! ];
//! let summary = Aggregation::new("events", GroupBy::Entity)
//!     .metric(MetricSpec::count("shots").with_filter(Predicate::category("Shot")))
//!     .metric(MetricSpec::count("goals").with_filter(Predicate::outcome("Goal")))
//!     .run(&records);
//!
//! let a = EntityKey::from("A");
//! assert_eq!(summary.get(&a, "shots"), MetricValue::Defined(2.0));
//! assert_eq!(summary.get(&a, "goals"), MetricValue::Defined(1.0));
//! ```

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    filter::Predicate,
    metric::{MetricValue, UndefinedMetric},
    record::{EntityKey, Record},
    summary::{Summary, SummaryRow},
};

/// How the values of a group are reduced to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    #[display("sum")]
    Sum,
    #[display("count")]
    Count,
    #[display("mean")]
    Mean,
    #[display("max")]
    Max,
    #[display("min")]
    Min,
}

/// One named metric computed for every group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Metric name in the resulting summary
    pub name: String,
    /// Measure to reduce; `None` makes every record contribute `1.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    pub reduction: Reduction,
    /// Records of the group that feed this metric; `None` means all of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Predicate>,
}

impl MetricSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, measure: Option<String>, reduction: Reduction) -> Self {
        Self {
            name: name.into(),
            measure,
            reduction,
            only: None,
        }
    }

    /// Number of records in the group.
    #[must_use]
    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, None, Reduction::Count)
    }

    #[must_use]
    pub fn sum(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::new(name, Some(measure.into()), Reduction::Sum)
    }

    #[must_use]
    pub fn mean(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::new(name, Some(measure.into()), Reduction::Mean)
    }

    #[must_use]
    pub fn max(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::new(name, Some(measure.into()), Reduction::Max)
    }

    #[must_use]
    pub fn min(name: impl Into<String>, measure: impl Into<String>) -> Self {
        Self::new(name, Some(measure.into()), Reduction::Min)
    }

    #[must_use]
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.only = Some(predicate);
        self
    }

    /// Value the record contributes, if it feeds this metric.
    fn contribution(&self, record: &Record) -> Option<f64> {
        if let Some(only) = &self.only
            && !only.matches(record)
        {
            return None;
        }
        match &self.measure {
            Some(measure) => record.measure(measure),
            None => Some(1.0),
        }
    }
}

type KeyFn = dyn Fn(&Record) -> Option<(EntityKey, Option<String>)> + Send + Sync;

/// Grouping key extractor.
#[derive(Clone)]
pub enum GroupBy {
    /// One group per entity, labelled with the entity's display name
    Entity,
    /// One group per team; records without a team are skipped
    Team,
    /// One group per category label
    Category,
    /// Caller-supplied key and optional label; `None` skips the record
    Custom(Arc<KeyFn>),
}

impl fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => f.write_str("Entity"),
            Self::Team => f.write_str("Team"),
            Self::Category => f.write_str("Category"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl GroupBy {
    pub fn custom<F>(key: F) -> Self
    where
        F: Fn(&Record) -> Option<(EntityKey, Option<String>)> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(key))
    }

    /// Group key and label of `record`, or `None` if the record belongs to no group.
    #[must_use]
    pub fn key(&self, record: &Record) -> Option<(EntityKey, Option<String>)> {
        match self {
            Self::Entity => Some((record.entity.clone(), record.name.clone())),
            Self::Team => record
                .team
                .as_ref()
                .map(|team| (EntityKey::new(team.clone()), Some(team.clone()))),
            Self::Category => Some((
                EntityKey::new(record.category.clone()),
                Some(record.category.clone()),
            )),
            Self::Custom(key) => key(record),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    max: f64,
    min: f64,
}

impl Accumulator {
    const EMPTY: Self = Self {
        count: 0,
        sum: 0.0,
        max: f64::NEG_INFINITY,
        min: f64::INFINITY,
    };

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = self.max.max(value);
        self.min = self.min.min(value);
    }

    #[expect(clippy::cast_precision_loss)]
    fn finish(&self, reduction: Reduction) -> MetricValue {
        if self.count == 0 {
            return match reduction {
                Reduction::Sum | Reduction::Count => MetricValue::Defined(0.0),
                Reduction::Mean | Reduction::Max | Reduction::Min => {
                    MetricValue::Undefined(UndefinedMetric::EmptyGroup)
                }
            };
        }
        let value = match reduction {
            Reduction::Sum => self.sum,
            Reduction::Count => self.count as f64,
            Reduction::Mean => self.sum / self.count as f64,
            Reduction::Max => self.max,
            Reduction::Min => self.min,
        };
        MetricValue::new(value)
    }
}

#[derive(Debug)]
struct Group {
    label: Option<String>,
    records: usize,
    accumulators: Vec<Accumulator>,
}

impl Group {
    fn new(label: Option<String>, metrics: usize) -> Self {
        Self {
            label,
            records: 0,
            accumulators: vec![Accumulator::EMPTY; metrics],
        }
    }
}

/// Builder and runner for one group-and-reduce pass.
#[derive(Debug, Clone)]
pub struct Aggregation {
    source: String,
    group_by: GroupBy,
    metrics: Vec<MetricSpec>,
    subjects: Vec<EntityKey>,
}

impl Aggregation {
    #[must_use]
    pub fn new(source: impl Into<String>, group_by: GroupBy) -> Self {
        Self {
            source: source.into(),
            group_by,
            metrics: Vec::new(),
            subjects: Vec::new(),
        }
    }

    #[must_use]
    pub fn metric(mut self, metric: MetricSpec) -> Self {
        self.metrics.push(metric);
        self
    }

    #[must_use]
    pub fn metrics<I>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = MetricSpec>,
    {
        self.metrics.extend(metrics);
        self
    }

    /// Adds a group key that must appear in the summary even without records.
    #[must_use]
    pub fn subject(mut self, key: impl Into<EntityKey>) -> Self {
        self.subjects.push(key.into());
        self
    }

    #[must_use]
    pub fn subjects<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<EntityKey>,
    {
        self.subjects.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Groups and reduces `records`, visiting each record once.
    pub fn run<'r, I>(&self, records: I) -> Summary
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut groups = self
            .subjects
            .iter()
            .map(|key| (key.clone(), Group::new(None, self.metrics.len())))
            .collect::<BTreeMap<_, _>>();

        for record in records {
            let Some((key, label)) = self.group_by.key(record) else {
                continue;
            };
            let group = groups
                .entry(key)
                .or_insert_with(|| Group::new(None, self.metrics.len()));
            if group.label.is_none() {
                group.label = label;
            }
            group.records += 1;
            for (spec, acc) in self.metrics.iter().zip(&mut group.accumulators) {
                if let Some(value) = spec.contribution(record) {
                    acc.push(value);
                }
            }
        }

        let rows = groups.into_iter().map(|(key, group)| {
            let metrics = self
                .metrics
                .iter()
                .zip(&group.accumulators)
                .map(|(spec, acc)| (spec.name.clone(), acc.finish(spec.reduction)))
                .collect();
            let row = SummaryRow {
                label: group.label.unwrap_or_else(|| key.to_string()),
                records: group.records,
                metrics,
            };
            (key, row)
        });
        Summary::from_rows(self.source.clone(), rows)
    }
}
