//! Percentile ranks against a reference population
//!
//! Used for radar-style profiles: each metric of a player is expressed as the
//! percentage of the population (for example, all midfielders of a league)
//! with a lower or equal value.

use footylab_stats::percentiles::percentile_of_score;

use crate::{
    metric::{MetricValue, UndefinedMetric},
    summary::{Summary, SummaryRow},
};

/// Percentile rank of every subject row for each of `metrics`.
///
/// Ranks use the `rank` kind of percentile-of-score (the mean of the strict
/// and weak percentages). Only defined population values take part. An
/// undefined subject value keeps its reason, and a metric with no defined
/// population value yields [`UndefinedMetric::EmptyPopulation`].
///
/// The resulting summary carries the subjects' source label.
#[must_use]
pub fn percentile_ranks(subjects: &Summary, population: &Summary, metrics: &[&str]) -> Summary {
    let populations = metrics
        .iter()
        .map(|metric| {
            population
                .rows()
                .filter_map(|(_, row)| row.metric(metric).as_defined())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let rows = subjects.rows().map(|(key, row)| {
        let ranks = metrics
            .iter()
            .zip(&populations)
            .map(|(metric, values)| {
                let rank = row.metric(metric).value().and_then(|score| {
                    percentile_of_score(values, score).ok_or(UndefinedMetric::EmptyPopulation)
                });
                ((*metric).to_owned(), MetricValue::from(rank))
            })
            .collect();
        let ranked = SummaryRow {
            label: row.label.clone(),
            records: row.records,
            metrics: ranks,
        };
        (key.clone(), ranked)
    });
    Summary::from_rows(subjects.source(), rows)
}
