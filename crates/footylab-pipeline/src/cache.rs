//! Time-limited cache of fetched datasets
//!
//! Fetching a competition season can be slow, so callers keep a
//! [`RecordCache`] and go through [`RecordCache::get_or_fetch`]. Entries are
//! keyed by source name and query, and are refetched once they are older than
//! the configured time-to-live. The clock is injectable so expiry can be
//! tested without sleeping.

use std::{cell::Cell, collections::HashMap, rc::Rc};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::{
    record::Record,
    source::{DataSource, Query, SourceError},
};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the cache.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    query: Query,
}

#[derive(Debug)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    records: Vec<Record>,
}

/// Fetched datasets keyed by `(source name, query)`, with a time-to-live.
#[derive(Debug)]
pub struct RecordCache<C = SystemClock> {
    ttl: TimeDelta,
    clock: C,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl RecordCache<SystemClock> {
    #[must_use]
    pub fn new(ttl: TimeDelta) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C> RecordCache<C>
where
    C: Clock,
{
    pub fn with_clock(ttl: TimeDelta, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached records for `query`, fetching them from `source` if
    /// they are absent or older than the time-to-live.
    ///
    /// A failed fetch leaves any previous entry untouched.
    pub fn get_or_fetch<S>(&mut self, source: &S, query: &Query) -> Result<&[Record], SourceError>
    where
        S: DataSource + ?Sized,
    {
        let key = CacheKey {
            source: source.name().to_owned(),
            query: query.clone(),
        };
        let now = self.clock.now();
        let fresh = match self.entries.get(&key) {
            Some(entry) if now - entry.fetched_at < self.ttl => {
                debug!("Cache hit for {query} from {}", key.source);
                true
            }
            Some(_) => {
                debug!("Cache entry for {query} from {} expired", key.source);
                false
            }
            None => {
                debug!("Cache miss for {query} from {}", key.source);
                false
            }
        };
        if !fresh {
            let records = source.fetch(query)?;
            self.entries.insert(
                key.clone(),
                CacheEntry {
                    fetched_at: now,
                    records,
                },
            );
        }
        Ok(self
            .entries
            .get(&key)
            .map_or(&[][..], |entry| entry.records.as_slice()))
    }

    /// Drops the entry for `query` from `source`. Returns whether one was present.
    pub fn invalidate<S>(&mut self, source: &S, query: &Query) -> bool
    where
        S: DataSource + ?Sized,
    {
        let key = CacheKey {
            source: source.name().to_owned(),
            query: query.clone(),
        };
        self.entries.remove(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every expired entry.
    pub fn purge_expired(&mut self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.fetched_at < ttl);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use crate::source::InMemorySource;

    use super::*;

    struct CountingSource {
        inner: InMemorySource,
        fetches: Cell<usize>,
    }

    impl DataSource for CountingSource {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn fetch(&self, query: &Query) -> Result<Vec<Record>, SourceError> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.fetch(query)
        }
    }

    fn setup() -> (CountingSource, Query, ManualClock) {
        let query = Query::competition_season(11, 37);
        let source = CountingSource {
            inner: InMemorySource::new("memory")
                .with_dataset(query.clone(), vec![Record::new("A", "Shot")]),
            fetches: Cell::new(0),
        };
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        (source, query, clock)
    }

    #[test]
    fn test_hit_within_ttl_and_refetch_after() {
        let (source, query, clock) = setup();
        let mut cache = RecordCache::with_clock(TimeDelta::minutes(10), clock.clone());

        assert_eq!(cache.get_or_fetch(&source, &query).unwrap().len(), 1);
        assert_eq!(source.fetches.get(), 1);

        clock.advance(TimeDelta::minutes(9));
        assert_eq!(cache.get_or_fetch(&source, &query).unwrap().len(), 1);
        assert_eq!(source.fetches.get(), 1);

        clock.advance(TimeDelta::minutes(1));
        cache.get_or_fetch(&source, &query).unwrap();
        assert_eq!(source.fetches.get(), 2);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let (source, query, clock) = setup();
        let mut cache = RecordCache::with_clock(TimeDelta::hours(1), clock);
        cache.get_or_fetch(&source, &query).unwrap();
        assert!(cache.invalidate(&source, &query));
        assert!(!cache.invalidate(&source, &query));
        cache.get_or_fetch(&source, &query).unwrap();
        assert_eq!(source.fetches.get(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_fetch_is_not_cached() {
        let (source, _, clock) = setup();
        let mut cache = RecordCache::with_clock(TimeDelta::hours(1), clock);
        let missing = Query::competition_season(1, 1);
        assert!(cache.get_or_fetch(&source, &missing).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (source, query, clock) = setup();
        let mut cache = RecordCache::with_clock(TimeDelta::seconds(30), clock.clone());
        cache.get_or_fetch(&source, &query).unwrap();
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        clock.advance(TimeDelta::seconds(31));
        cache.purge_expired();
        assert!(cache.is_empty());
    }
}
