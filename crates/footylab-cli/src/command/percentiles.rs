//! Percentile rank command
//!
//! Ranks players against every player of a dataset (optionally only those in a
//! position and above a minutes threshold), metric by metric, as used for
//! radar charts.

use std::{collections::BTreeSet, path::PathBuf};

use clap::Args;
use footylab_pipeline::{
    exposure::ExposureTable,
    filter::{Predicate, filter},
    profile::MetricProfile,
    ranking::percentile_ranks,
    record::EntityKey,
    report::EntityReport,
};
use serde::Serialize;
use tracing::info;

use crate::{
    command::GlobalArg,
    table::{Cell, Table},
    util::{self, DatasetArg, Datasets},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct PercentilesArg {
    /// Dataset to analyze (COMPETITION:SEASON)
    pub dataset: DatasetArg,

    /// Player to rank (repeatable)
    #[arg(long = "player", required = true)]
    pub players: Vec<String>,

    /// Only compare against players whose position contains this text (e.g. "Midfield")
    #[arg(long)]
    pub position: Option<String>,

    /// Minimum minutes played to be part of the population
    #[arg(long, default_value_t = 0.0)]
    pub min_minutes: f64,

    /// Metric profile JSON file (defaults to the built-in event profile)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Metrics to rank (comma-separated; defaults to every derived metric)
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RankRow<'a> {
    entity: &'a EntityKey,
    player: &'a str,
    metric: &'a str,
    value: Cell,
    percentile: Cell,
}

pub(crate) fn run(global: &GlobalArg, arg: &PercentilesArg) -> anyhow::Result<()> {
    let profile = util::load_profile(arg.profile.as_deref(), MetricProfile::events_default)?;
    let mut datasets = Datasets::new(&global.data_dir);
    let records = datasets.records(&arg.dataset)?;
    let source = arg.dataset.to_string();
    let exposure = ExposureTable::estimate_from_events(records);

    let subjects = arg
        .players
        .iter()
        .map(|player| util::resolve_player(records, player).map(|candidate| candidate.entity))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let in_position = arg
        .position
        .as_ref()
        .map_or_else(|| Predicate::All { of: Vec::new() }, Predicate::position_contains);
    let population = filter(records, &in_position)
        .map(|record| record.entity.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|entity| exposure.minutes(entity).is_some_and(|m| m >= arg.min_minutes))
        .collect::<Vec<_>>();
    info!("Ranking {} players against {} players", subjects.len(), population.len());

    let subject_report = EntityReport::build(&source, records, &subjects, &profile, &exposure);
    let population_report = EntityReport::build(&source, records, &population, &profile, &exposure);

    let metrics = if arg.metrics.is_empty() {
        profile.derived_names()
    } else {
        arg.metrics.clone()
    };
    let metrics = metrics.iter().map(String::as_str).collect::<Vec<_>>();
    let ranks = percentile_ranks(&subject_report.rates, &population_report.rates, &metrics);

    let mut table = Table::new(
        format!("Percentile ranks among {} players", population.len()),
        ["player", "metric", "value", "percentile"],
    );
    let mut json_rows = Vec::new();
    for (key, row) in subject_report.rates.rows() {
        for metric in &metrics {
            let value = Cell::from(row.metric(metric));
            let percentile = Cell::from(ranks.get(key, metric));
            table.push_row([
                Cell::from(row.label.as_str()),
                Cell::from(*metric),
                value.clone(),
                percentile.clone(),
            ]);
            json_rows.push(RankRow {
                entity: key,
                player: &row.label,
                metric: *metric,
                value,
                percentile,
            });
        }
    }
    util::emit(global, &[table], &json_rows)
}
