//! Raw observations fed into the pipeline
//!
//! A [`Record`] is a single observed event (a shot, a pass, a carry) or a single
//! tabular entry (a salary line). Every record belongs to one entity, carries a
//! category label and an optional outcome label, and may hold any number of
//! numeric measures.
//!
//! # Serialization
//!
//! Records are stored on disk as JSON arrays. Entity keys may be written either
//! as strings or as integers:
//!
//! ```json
//! [
//!   {
//!     "entity": 5503,
//!     "name": "Lionel Messi",
//!     "team": "Barcelona",
//!     "match_id": 69249,
//!     "category": "Shot",
//!     "outcome": "Goal",
//!     "minute": 88,
//!     "measures": { "x": 108.0, "y": 41.0, "xg": 0.31 }
//!   }
//! ]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable identifier of the subject of analysis (player id, team id, ...).
///
/// Keys are unique within one data source only; keys from different sources
/// are not comparable without an explicit mapping.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<u64> for EntityKey {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKey {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Text(text) => Self(text),
            RawKey::Unsigned(n) => Self(n.to_string()),
            RawKey::Signed(n) => Self(n.to_string()),
        })
    }
}

/// A single observed event or tabular entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Entity the record belongs to
    pub entity: EntityKey,
    /// Display name of the entity, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Team the entity played for when the record was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Position label (e.g. `"Left Center Midfield"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Match the record was observed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<u64>,
    /// Category label, typically the event type (`"Shot"`, `"Pass"`, ...)
    pub category: String,
    /// Outcome label (`"Goal"`, `"Complete"`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Match minute the record was observed at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    /// Numeric measures keyed by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub measures: BTreeMap<String, f64>,
}

impl Record {
    /// Creates a record with only an entity and a category.
    ///
    /// # Examples
    ///
    /// ```
    /// use footylab_pipeline::record::Record;
    ///
    /// let shot = Record::new("A", "Shot")
    ///     .with_outcome("Goal")
    ///     .with_match(1)
    ///     .with_minute(17)
    ///     .with_measure("xg", 0.4);
    /// assert_eq!(shot.measure("xg"), Some(0.4));
    /// assert_eq!(shot.display_name(), "A");
    /// ```
    #[must_use]
    pub fn new(entity: impl Into<EntityKey>, category: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            name: None,
            team: None,
            position: None,
            match_id: None,
            category: category.into(),
            outcome: None,
            minute: None,
            measures: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    #[must_use]
    pub fn with_match(mut self, match_id: u64) -> Self {
        self.match_id = Some(match_id);
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    #[must_use]
    pub fn with_minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }

    #[must_use]
    pub fn with_measure(mut self, name: impl Into<String>, value: f64) -> Self {
        self.measures.insert(name.into(), value);
        self
    }

    /// Returns a measure if it is present and finite.
    #[must_use]
    pub fn measure(&self, name: &str) -> Option<f64> {
        self.measures
            .get(name)
            .copied()
            .filter(|value| value.is_finite())
    }

    /// Name shown to people: the display name, or the entity key if no name is known.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.entity.as_str())
    }
}
