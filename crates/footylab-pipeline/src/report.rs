//! Per-entity reports: totals plus exposure-adjusted rates

use crate::{
    aggregate::{Aggregation, GroupBy},
    exposure::ExposureTable,
    filter::{Predicate, filter},
    metric::{MetricValue, UndefinedMetric},
    normalize::derive,
    profile::MetricProfile,
    record::{EntityKey, Record},
    summary::{Summary, SummaryRow},
};

/// Name of the exposure metric added to [`EntityReport::rates`].
pub const MINUTES_METRIC: &str = "minutes";

/// Aggregated totals and derived rates for a set of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    /// Metrics of the profile, one row per entity
    pub totals: Summary,
    /// Derived metrics of the profile plus [`MINUTES_METRIC`]
    pub rates: Summary,
}

impl EntityReport {
    /// Runs aggregation and derivation for `subjects`.
    ///
    /// Every subject gets a row even if it has no records. With no subjects,
    /// every entity present in `records` is reported.
    pub fn build<'r, I>(
        source: &str,
        records: I,
        subjects: &[EntityKey],
        profile: &MetricProfile,
        exposure: &ExposureTable,
    ) -> Self
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let aggregation = Aggregation::new(source, GroupBy::Entity)
            .metrics(profile.metrics.iter().cloned())
            .subjects(subjects.iter().cloned());
        let totals = if subjects.is_empty() {
            aggregation.run(records)
        } else {
            let only_subjects = Predicate::any_entity(subjects.iter().cloned());
            aggregation.run(filter(records, &only_subjects))
        };

        let minutes = Summary::from_rows(
            source,
            totals.rows().map(|(key, row)| {
                let minutes = exposure.minutes(key).map_or(
                    MetricValue::Undefined(UndefinedMetric::MissingExposure),
                    MetricValue::new,
                );
                let row = SummaryRow::new(row.label.clone(), row.records)
                    .with_metric(MINUTES_METRIC, minutes);
                (key.clone(), row)
            }),
        );
        let rates = derive(&totals, exposure, &profile.derived).merge_metrics(&minutes);
        Self { totals, rates }
    }

    #[must_use]
    pub fn minutes(&self, key: &EntityKey) -> MetricValue {
        self.rates.get(key, MINUTES_METRIC)
    }
}

#[cfg(test)]
mod tests {
    use crate::{aggregate::MetricSpec, normalize::DerivedMetric};

    use super::*;

    fn shots_and_goals() -> MetricProfile {
        MetricProfile {
            metrics: vec![
                MetricSpec::count("shots").with_filter(Predicate::category("Shot")),
                MetricSpec::count("goals").with_filter(
                    Predicate::category("Shot").and(Predicate::outcome("Goal")),
                ),
            ],
            derived: vec![DerivedMetric::per_90("shots"), DerivedMetric::per_90("goals")],
        }
    }

    #[test]
    fn test_end_to_end_per_90() {
        let records = [
            Record::new("A", "Shot").with_outcome("Goal"),
            Record::new("A", "Shot").with_outcome("Miss"),
            Record::new("B", "Shot").with_outcome("Goal"),
        ];
        let exposure = [("A", 45.0)].into_iter().collect::<ExposureTable>();
        let a = EntityKey::from("A");
        let report = EntityReport::build(
            "events",
            &records,
            std::slice::from_ref(&a),
            &shots_and_goals(),
            &exposure,
        );

        assert_eq!(report.rates.len(), 1);
        assert_eq!(report.rates.get(&a, "shots_per_90"), MetricValue::Defined(4.0));
        assert_eq!(report.rates.get(&a, "goals_per_90"), MetricValue::Defined(2.0));
        assert_eq!(report.minutes(&a), MetricValue::Defined(45.0));
        assert_eq!(report.totals.get(&a, "shots"), MetricValue::Defined(2.0));
    }

    #[test]
    fn test_subject_without_events_or_minutes() {
        let records = [Record::new("A", "Shot")];
        let z = EntityKey::from("Z");
        let report = EntityReport::build(
            "events",
            &records,
            std::slice::from_ref(&z),
            &shots_and_goals(),
            &ExposureTable::new(),
        );
        assert_eq!(report.totals.get(&z, "shots"), MetricValue::Defined(0.0));
        assert_eq!(
            report.rates.get(&z, "shots_per_90"),
            MetricValue::Undefined(UndefinedMetric::MissingExposure)
        );
        assert_eq!(
            report.minutes(&z),
            MetricValue::Undefined(UndefinedMetric::MissingExposure)
        );
    }

    #[test]
    fn test_no_subjects_reports_everyone() {
        let records = [Record::new("A", "Shot"), Record::new("B", "Pass")];
        let report = EntityReport::build(
            "events",
            &records,
            &[],
            &shots_and_goals(),
            &ExposureTable::estimate_from_events(&records),
        );
        assert_eq!(report.totals.len(), 2);
    }
}
