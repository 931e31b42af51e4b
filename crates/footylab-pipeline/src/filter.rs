//! Record filtering
//!
//! The filter stage narrows a record sequence to the records matching a
//! [`Predicate`]. Filtering is lazy, never mutates its input, and yields an
//! empty sequence (not an error) when nothing matches.
//!
//! Predicates are plain data, so they can be written in metric profiles:
//!
//! ```json
//! {
//!   "kind": "all",
//!   "of": [
//!     { "kind": "category", "name": "Carry" },
//!     { "kind": "difference", "minuend": "end_x", "subtrahend": "x", "min": 5.0 }
//!   ]
//! }
//! ```
//!
//! # Examples
//!
//! ```
//! use footylab_pipeline::{filter::{self, Predicate}, record::Record};
//!
//! let records = vec![
//!     Record::new("A", "Shot").with_outcome("Goal"),
//!     Record::new("A", "Shot").with_outcome("Saved"),
//!     Record::new("B", "Pass"),
//! ];
//! let goals = Predicate::category("shot").and(Predicate::outcome("GOAL"));
//! assert_eq!(filter::filter(&records, &goals).count(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::record::{EntityKey, Record};

/// Condition over a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Entity key equals `key`
    Entity { key: EntityKey },
    /// Display name contains `text`, ignoring case
    NameContains { text: String },
    /// Team equals `name`, ignoring case
    Team { name: String },
    /// Position contains `text`, ignoring case
    PositionContains { text: String },
    /// Category equals `name`, ignoring case
    Category { name: String },
    /// Outcome equals `name`, ignoring case
    Outcome { name: String },
    /// Measure is present and finite
    HasMeasure { measure: String },
    /// Measure is present, finite and non-zero
    Flag { measure: String },
    /// Measure is present and within `[min, max]`; a missing bound is unbounded
    MeasureRange {
        measure: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// `minuend - subtrahend >= min`, both measures present
    Difference {
        minuend: String,
        subtrahend: String,
        min: f64,
    },
    /// Every inner predicate matches (an empty list matches everything)
    All { of: Vec<Predicate> },
    /// At least one inner predicate matches
    Any { of: Vec<Predicate> },
    /// The inner predicate does not match
    Not { of: Box<Predicate> },
}

impl Predicate {
    #[must_use]
    pub fn entity(key: impl Into<EntityKey>) -> Self {
        Self::Entity { key: key.into() }
    }

    #[must_use]
    pub fn name_contains(text: impl Into<String>) -> Self {
        Self::NameContains { text: text.into() }
    }

    #[must_use]
    pub fn team(name: impl Into<String>) -> Self {
        Self::Team { name: name.into() }
    }

    #[must_use]
    pub fn position_contains(text: impl Into<String>) -> Self {
        Self::PositionContains { text: text.into() }
    }

    #[must_use]
    pub fn category(name: impl Into<String>) -> Self {
        Self::Category { name: name.into() }
    }

    #[must_use]
    pub fn outcome(name: impl Into<String>) -> Self {
        Self::Outcome { name: name.into() }
    }

    #[must_use]
    pub fn has_measure(measure: impl Into<String>) -> Self {
        Self::HasMeasure {
            measure: measure.into(),
        }
    }

    #[must_use]
    pub fn flag(measure: impl Into<String>) -> Self {
        Self::Flag {
            measure: measure.into(),
        }
    }

    #[must_use]
    pub fn measure_range(measure: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::MeasureRange {
            measure: measure.into(),
            min,
            max,
        }
    }

    #[must_use]
    pub fn difference(minuend: impl Into<String>, subtrahend: impl Into<String>, min: f64) -> Self {
        Self::Difference {
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
            min,
        }
    }

    /// Matches any of the given entities.
    #[must_use]
    pub fn any_entity<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<EntityKey>,
    {
        Self::Any {
            of: keys.into_iter().map(Self::entity).collect(),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested [`Predicate::All`].
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::All { mut of } => {
                of.push(other);
                Self::All { of }
            }
            this => Self::All {
                of: vec![this, other],
            },
        }
    }

    /// Disjunction of `self` and `other`, flattening nested [`Predicate::Any`].
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Any { mut of } => {
                of.push(other);
                Self::Any { of }
            }
            this => Self::Any {
                of: vec![this, other],
            },
        }
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not { of: Box::new(self) }
    }

    /// Evaluates the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Entity { key } => record.entity == *key,
            Self::NameContains { text } => contains_ignore_case(record.display_name(), text),
            Self::Team { name } => record
                .team
                .as_deref()
                .is_some_and(|team| eq_ignore_case(team, name)),
            Self::PositionContains { text } => record
                .position
                .as_deref()
                .is_some_and(|position| contains_ignore_case(position, text)),
            Self::Category { name } => eq_ignore_case(&record.category, name),
            Self::Outcome { name } => record
                .outcome
                .as_deref()
                .is_some_and(|outcome| eq_ignore_case(outcome, name)),
            Self::HasMeasure { measure } => record.measure(measure).is_some(),
            Self::Flag { measure } => record.measure(measure).is_some_and(|v| v != 0.0),
            Self::MeasureRange { measure, min, max } => {
                record.measure(measure).is_some_and(|value| {
                    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
                })
            }
            Self::Difference {
                minuend,
                subtrahend,
                min,
            } => match (record.measure(minuend), record.measure(subtrahend)) {
                (Some(a), Some(b)) => a - b >= *min,
                _ => false,
            },
            Self::All { of } => of.iter().all(|p| p.matches(record)),
            Self::Any { of } => of.iter().any(|p| p.matches(record)),
            Self::Not { of } => !of.matches(record),
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Lazily yields the records matching `predicate`, in input order.
pub fn filter<'r, I>(records: I, predicate: &Predicate) -> impl Iterator<Item = &'r Record>
where
    I: IntoIterator<Item = &'r Record>,
{
    records
        .into_iter()
        .filter(move |record| predicate.matches(record))
}

/// Distinct entities hit by a case-insensitive partial name match.
///
/// A partial name such as `"Messi"` may hit more than one entity. The hits are
/// all reported so the caller can decide; nothing is collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMatches {
    /// The text that was searched for
    pub query: String,
    /// Every matching entity with all display names seen for it
    pub entities: BTreeMap<EntityKey, BTreeSet<String>>,
}

impl NameMatches {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// `true` when more than one distinct entity matched.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.entities.len() > 1
    }

    /// The single matching entity, if exactly one matched.
    #[must_use]
    pub fn unique(&self) -> Option<&EntityKey> {
        match self.entities.len() {
            1 => self.entities.keys().next(),
            _ => None,
        }
    }
}

/// Collects the distinct entities whose display name contains `query`.
///
/// # Examples
///
/// ```
/// use footylab_pipeline::{filter::name_matches, record::Record};
///
/// let records = vec![
///     Record::new("5503", "Pass").with_name("Lionel Andrés Messi Cuccittini"),
///     Record::new("9001", "Pass").with_name("Messi Junior"),
/// ];
/// let matches = name_matches(&records, "messi");
/// assert!(matches.is_ambiguous());
/// assert_eq!(matches.unique(), None);
/// ```
pub fn name_matches<'r, I>(records: I, query: &str) -> NameMatches
where
    I: IntoIterator<Item = &'r Record>,
{
    let predicate = Predicate::name_contains(query);
    let mut entities = BTreeMap::<EntityKey, BTreeSet<String>>::new();
    for record in filter(records, &predicate) {
        entities
            .entry(record.entity.clone())
            .or_default()
            .insert(record.display_name().to_owned());
    }
    NameMatches {
        query: query.to_owned(),
        entities,
    }
}
