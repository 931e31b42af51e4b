//! Player name resolution
//!
//! Names in football datasets are inconsistent: nicknames and full names,
//! accents present or missing, "Lionel Messi" against "Lionel Andrés Messi
//! Cuccittini". [`NameIndex`] resolves a free-text query to entity keys in
//! three tiers, stopping at the first tier that finds anything:
//!
//! 1. **Exact**: the normalized query equals a normalized name.
//! 2. **Tokens**: every query token occurs in the normalized name.
//! 3. **Fuzzy**: the Levenshtein distance between the normalized query and a
//!    normalized name is within a length-dependent threshold.
//!
//! Candidates in the same tier are equally likely, except in the fuzzy tier
//! where a strictly smaller distance wins. When more than one entity is equally
//! likely, [`NameIndex::resolve_unique`] reports [`MatchError::Ambiguous`] with
//! the ranked candidates instead of guessing.
//!
//! # Examples
//!
//! ```
//! use footylab_pipeline::{matching::NameIndex, record::Record};
//!
//! let records = vec![
//!     Record::new("5503", "Pass").with_name("Lionel Andrés Messi Cuccittini"),
//!     Record::new("6374", "Pass").with_name("Lamine Yamal Nasraoui Ebana"),
//! ];
//! let index = NameIndex::from_records(&records);
//!
//! let messi = index.resolve_unique("lionel messi").unwrap();
//! assert_eq!(messi.entity.as_str(), "5503");
//!
//! // typo falls through to the fuzzy tier
//! let yamal = index.resolve_unique("Lamine Yamal Nasraoui Ebanna").unwrap();
//! assert_eq!(yamal.entity.as_str(), "6374");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::record::{EntityKey, Record};

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Tokens,
    Fuzzy,
}

/// A possible resolution of a name query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub entity: EntityKey,
    /// The indexed name that matched
    pub name: String,
    pub tier: MatchTier,
    /// Edit distance between the normalized query and the normalized name
    pub distance: usize,
}

/// Ranked candidates for a query, best first, at most one per entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub query: String,
    pub candidates: Vec<Candidate>,
}

impl Resolution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates that are as likely as the best one.
    #[must_use]
    pub fn best(&self) -> &[Candidate] {
        let Some(first) = self.candidates.first() else {
            return &[];
        };
        let equally_likely = |c: &Candidate| match first.tier {
            MatchTier::Fuzzy => c.tier == first.tier && c.distance == first.distance,
            MatchTier::Exact | MatchTier::Tokens => c.tier == first.tier,
        };
        let len = self
            .candidates
            .iter()
            .take_while(|c| equally_likely(c))
            .count();
        &self.candidates[..len]
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MatchError {
    #[display("no entity matches name '{query}'")]
    NoMatch { query: String },
    #[display(
        "name '{query}' is ambiguous: {}",
        candidates.iter().map(|c| format!("{} ({})", c.name, c.entity)).collect::<Vec<_>>().join(", ")
    )]
    Ambiguous {
        query: String,
        candidates: Vec<Candidate>,
    },
}

#[derive(Debug, Clone)]
struct IndexEntry {
    entity: EntityKey,
    name: String,
    normalized: String,
}

/// Lookup structure from display names to entity keys.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: Vec<IndexEntry>,
}

impl NameIndex {
    /// Builds an index from the distinct `(entity, display name)` pairs in `records`.
    pub fn from_records<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let pairs = records
            .into_iter()
            .map(|record| (record.entity.clone(), record.display_name().to_owned()))
            .collect::<BTreeSet<_>>();
        let mut index = Self::default();
        for (entity, name) in pairs {
            index.insert(entity, name);
        }
        index
    }

    /// Adds a name (or an alias such as a nickname) for an entity.
    pub fn insert(&mut self, entity: EntityKey, name: impl Into<String>) {
        let name = name.into();
        let normalized = normalize_name(&name);
        if normalized.is_empty() {
            return;
        }
        self.entries.push(IndexEntry {
            entity,
            name,
            normalized,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked candidates for `query`.
    #[must_use]
    pub fn resolve(&self, query: &str) -> Resolution {
        let normalized_query = normalize_name(query);
        let tokens = normalized_query.split(' ').collect::<Vec<_>>();
        let threshold = fuzzy_threshold(&normalized_query);

        let mut best = BTreeMap::<&EntityKey, Candidate>::new();
        for tier in [MatchTier::Exact, MatchTier::Tokens, MatchTier::Fuzzy] {
            for entry in &self.entries {
                let hit = match tier {
                    MatchTier::Exact => entry.normalized == normalized_query,
                    MatchTier::Tokens => tokens.iter().all(|t| entry.normalized.contains(t)),
                    MatchTier::Fuzzy => true,
                };
                if !hit || normalized_query.is_empty() {
                    continue;
                }
                let distance = levenshtein(&normalized_query, &entry.normalized);
                if tier == MatchTier::Fuzzy && distance > threshold {
                    continue;
                }
                let candidate = Candidate {
                    entity: entry.entity.clone(),
                    name: entry.name.clone(),
                    tier,
                    distance,
                };
                best.entry(&entry.entity)
                    .and_modify(|current| {
                        if candidate.distance < current.distance {
                            *current = candidate.clone();
                        }
                    })
                    .or_insert(candidate);
            }
            if !best.is_empty() {
                break;
            }
        }

        let mut candidates = best.into_values().collect::<Vec<_>>();
        candidates.sort_by(|a, b| {
            (a.tier, a.distance, &a.entity).cmp(&(b.tier, b.distance, &b.entity))
        });
        debug!("Resolved '{query}' to {} candidates", candidates.len());
        Resolution {
            query: query.to_owned(),
            candidates,
        }
    }

    /// Resolves `query` to exactly one entity.
    ///
    /// # Errors
    ///
    /// * [`MatchError::NoMatch`] if nothing matches in any tier
    /// * [`MatchError::Ambiguous`] if several entities are equally likely
    pub fn resolve_unique(&self, query: &str) -> Result<Candidate, MatchError> {
        let resolution = self.resolve(query);
        match resolution.best() {
            [] => Err(MatchError::NoMatch {
                query: query.to_owned(),
            }),
            [single] => Ok(single.clone()),
            _ => {
                warn!(
                    "Name '{query}' is ambiguous between {} players",
                    resolution.best().len()
                );
                Err(MatchError::Ambiguous {
                    query: query.to_owned(),
                    candidates: resolution.candidates,
                })
            }
        }
    }
}

/// Largest edit distance accepted by the fuzzy tier.
fn fuzzy_threshold(normalized_query: &str) -> usize {
    (normalized_query.chars().count() / 4).max(1)
}

/// Normalizes a name for comparison.
///
/// Lowercases, folds common Latin diacritics, turns punctuation into spaces and
/// collapses runs of whitespace.
///
/// # Examples
///
/// ```
/// use footylab_pipeline::matching::normalize_name;
///
/// assert_eq!(normalize_name("  Aitana  Bonmatí-Conca "), "aitana bonmati conca");
/// assert_eq!(normalize_name("Ødegaard, Martin"), "odegaard martin");
/// ```
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match fold_diacritic(c) {
            Some(ascii) => folded.push_str(ascii),
            None if c.is_alphanumeric() => folded.push(c),
            None => folded.push(' '),
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_diacritic(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Levenshtein edit distance between two strings, counted in chars.
///
/// # Examples
///
/// ```
/// use footylab_pipeline::matching::levenshtein;
///
/// assert_eq!(levenshtein("kitten", "sitting"), 3);
/// assert_eq!(levenshtein("", "abc"), 3);
/// ```
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b = b.chars().collect::<Vec<_>>();
    let mut prev = (0..=b.len()).collect::<Vec<_>>();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[(&str, &str)]) -> NameIndex {
        let mut index = NameIndex::default();
        for (entity, name) in names {
            index.insert(EntityKey::from(*entity), *name);
        }
        index
    }

    #[test]
    fn test_exact_match_beats_token_match() {
        let index = index(&[("1", "Pedri"), ("2", "Pedri Junior")]);
        let candidate = index.resolve_unique("PEDRI").unwrap();
        assert_eq!(candidate.entity.as_str(), "1");
        assert_eq!(candidate.tier, MatchTier::Exact);
    }

    #[test]
    fn test_token_matches_are_ambiguous() {
        let index = index(&[
            ("5503", "Lionel Andrés Messi Cuccittini"),
            ("9001", "Messi Junior"),
        ]);
        let err = index.resolve_unique("messi").unwrap_err();
        let MatchError::Ambiguous { candidates, .. } = err else {
            panic!("expected ambiguity, got {err}");
        };
        assert_eq!(candidates.len(), 2);
        // closer name ranks first for display
        assert_eq!(candidates[0].entity.as_str(), "9001");
    }

    #[test]
    fn test_duplicate_exact_names_are_ambiguous() {
        let index = index(&[("1", "Ronaldo"), ("2", "Ronaldo")]);
        assert!(matches!(
            index.resolve_unique("Ronaldo"),
            Err(MatchError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_aliases_of_one_entity_are_not_ambiguous() {
        let index = index(&[("1", "Lamine Yamal"), ("1", "Lamine Yamal Nasraoui Ebana")]);
        let candidate = index.resolve_unique("yamal").unwrap();
        assert_eq!(candidate.entity.as_str(), "1");
        assert_eq!(candidate.name, "Lamine Yamal");
    }

    #[test]
    fn test_fuzzy_prefers_strictly_closer_name() {
        let index = index(&[("1", "Bellingham"), ("2", "Bellamy")]);
        let candidate = index.resolve_unique("Belingham").unwrap();
        assert_eq!(candidate.entity.as_str(), "1");
        assert_eq!(candidate.tier, MatchTier::Fuzzy);
        assert_eq!(candidate.distance, 1);
    }

    #[test]
    fn test_fuzzy_tie_is_ambiguous() {
        let index = index(&[("1", "Kane"), ("2", "Kant")]);
        let err = index.resolve_unique("Kano").unwrap_err();
        assert!(matches!(err, MatchError::Ambiguous { .. }));
    }

    #[test]
    fn test_no_match() {
        let index = index(&[("1", "Pedri")]);
        assert!(matches!(
            index.resolve_unique("Xavi Hernandez"),
            Err(MatchError::NoMatch { .. })
        ));
        assert!(index.resolve("   ").is_empty());
    }

    #[test]
    fn test_accents_are_folded() {
        let index = index(&[("1", "Aitana Bonmatí")]);
        assert_eq!(
            index.resolve_unique("aitana bonmati").unwrap().tier,
            MatchTier::Exact
        );
    }

    #[test]
    fn test_levenshtein_is_symmetric() {
        assert_eq!(levenshtein("messi", "mesut"), levenshtein("mesut", "messi"));
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
