//! Football analysis pipeline: fetch, filter, aggregate, normalize, compare.
//!
//! This crate turns raw event and tabular records into fair, comparable
//! per-player and per-team metrics. Each stage is a pure function over
//! immutable inputs; the only state is the explicit [`cache::RecordCache`]
//! owned by the caller.
//!
//! # Architecture
//!
//! ```text
//! DataSource ──fetch──► Vec<Record>
//!     (RecordCache)         │
//!                           ▼ filter (Predicate)
//!                      &Record iterator
//!                           │
//!                           ▼ aggregate (GroupBy + MetricSpec)
//!                        Summary (totals)
//!                           │
//!                           ▼ normalize (ExposureTable + DerivedMetric)
//!                        Summary (per-90, percentages)
//!                           │
//!                           ▼ compare / ranking
//!             Comparison rows, percentile ranks
//! ```
//!
//! # Modules
//!
//! ## Inputs
//!
//! - [`record`] - Records and entity keys
//! - [`source`] - Data source trait, local file and in-memory sources
//! - [`cache`] - Time-limited record cache with an injectable clock
//!
//! ## Stages
//!
//! - [`filter`] - Record predicates and partial name matches
//! - [`matching`] - Tiered player name resolution
//! - [`aggregate`] - Grouping and reductions
//! - [`exposure`] - Minutes played per entity
//! - [`normalize`] - Per-90 rates and percentages
//! - [`compare`] - Long-format comparison of two summaries
//! - [`ranking`] - Percentile ranks against a population
//!
//! ## Results and configuration
//!
//! - [`metric`] - Metric values that carry the reason they are undefined
//! - [`summary`] - Per-entity metric tables
//! - [`profile`] - JSON metric profiles
//! - [`report`] - Totals and rates for a set of entities
//! - [`salary`] - Salary, goals and age join for league player-seasons
//!
//! # Undefined values
//!
//! Dividing by zero minutes or averaging an empty group does not produce `0`
//! or `NaN`. Such values are [`metric::MetricValue::Undefined`] with an
//! [`metric::UndefinedMetric`] reason, and stay undefined through every later
//! stage.
//!
//! # Example
//!
//! ```
//! use footylab_pipeline::{
//!     exposure::ExposureTable,
//!     metric::MetricValue,
//!     profile::MetricProfile,
//!     record::{EntityKey, Record},
//!     report::EntityReport,
//! };
//!
//! let records = [
//!     Record::new("A", "Shot").with_outcome("Goal"),
//!     Record::new("A", "Shot").with_outcome("Miss"),
//! ];
//! let exposure = [("A", 45.0)].into_iter().collect::<ExposureTable>();
//! let report = EntityReport::build(
//!     "events",
//!     &records,
//!     &[EntityKey::from("A")],
//!     &MetricProfile::events_default(),
//!     &exposure,
//! );
//!
//! let a = EntityKey::from("A");
//! assert_eq!(report.rates.get(&a, "shots_per_90"), MetricValue::Defined(4.0));
//! assert_eq!(report.rates.get(&a, "goals_per_90"), MetricValue::Defined(2.0));
//! ```

pub mod aggregate;
pub mod cache;
pub mod compare;
pub mod exposure;
pub mod filter;
pub mod matching;
pub mod metric;
pub mod normalize;
pub mod profile;
pub mod ranking;
pub mod record;
pub mod report;
pub mod salary;
pub mod source;
pub mod summary;
