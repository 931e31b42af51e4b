//! Minutes played per entity

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::record::{EntityKey, Record};

/// Exposure measure (minutes played) per entity in one dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExposureTable {
    minutes: BTreeMap<EntityKey, f64>,
}

impl ExposureTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minutes of `entity`, replacing any previous value.
    pub fn insert(&mut self, entity: impl Into<EntityKey>, minutes: f64) {
        self.minutes.insert(entity.into(), minutes);
    }

    /// Minutes of `entity`, as stored. Validation happens at normalization time.
    #[must_use]
    pub fn minutes(&self, entity: &EntityKey) -> Option<f64> {
        self.minutes.get(entity).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, f64)> {
        self.minutes.iter().map(|(key, minutes)| (key, *minutes))
    }

    /// Estimates minutes played from event timestamps.
    ///
    /// For each entity, the latest event minute of each match is taken as the
    /// time the entity spent on the pitch in that match, and the matches are
    /// summed. Records without a match id are counted together as one match.
    /// Records without a minute are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use footylab_pipeline::{exposure::ExposureTable, record::{EntityKey, Record}};
    ///
    /// let records = [
    ///     Record::new("A", "Pass").with_match(1).with_minute(30),
    ///     Record::new("A", "Shot").with_match(1).with_minute(88),
    ///     Record::new("A", "Pass").with_match(2).with_minute(45),
    /// ];
    /// let exposure = ExposureTable::estimate_from_events(&records);
    /// assert_eq!(exposure.minutes(&EntityKey::from("A")), Some(133.0));
    /// ```
    pub fn estimate_from_events<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut latest = HashMap::<(&EntityKey, Option<u64>), u32>::new();
        for record in records {
            let Some(minute) = record.minute else {
                continue;
            };
            let slot = latest.entry((&record.entity, record.match_id)).or_default();
            *slot = (*slot).max(minute);
        }

        let mut table = Self::new();
        for ((entity, _), minute) in latest {
            *table.minutes.entry(entity.clone()).or_default() += f64::from(minute);
        }
        table
    }
}

impl<K> FromIterator<(K, f64)> for ExposureTable
where
    K: Into<EntityKey>,
{
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            minutes: iter.into_iter().map(|(k, m)| (k.into(), m)).collect(),
        }
    }
}
