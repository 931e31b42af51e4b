//! Player comparison command
//!
//! Compares two players from two datasets (possibly different competitions
//! with unrelated player ids) on the per-90 metrics of a profile.

use std::path::PathBuf;

use clap::Args;
use footylab_pipeline::{
    compare::{Comparison, compare},
    exposure::ExposureTable,
    profile::MetricProfile,
    record::Record,
    report::{EntityReport, MINUTES_METRIC},
    summary::Summary,
};
use tracing::info;

use crate::{
    command::GlobalArg,
    table::{Cell, Table},
    util::{self, DatasetArg, Datasets},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareArg {
    /// First dataset (COMPETITION:SEASON)
    pub left: DatasetArg,
    /// Player name in the first dataset
    pub left_player: String,
    /// Second dataset (COMPETITION:SEASON)
    pub right: DatasetArg,
    /// Player name in the second dataset
    pub right_player: String,

    /// Metric profile JSON file (defaults to the built-in event profile)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Metrics to compare (comma-separated; defaults to every derived metric and minutes)
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Minutes played by the first player, instead of estimating them from events
    #[arg(long)]
    pub left_minutes: Option<f64>,

    /// Minutes played by the second player, instead of estimating them from events
    #[arg(long)]
    pub right_minutes: Option<f64>,
}

pub(crate) fn run(global: &GlobalArg, arg: &CompareArg) -> anyhow::Result<()> {
    let profile = util::load_profile(arg.profile.as_deref(), MetricProfile::events_default)?;
    let mut datasets = Datasets::new(&global.data_dir);

    let left_records = datasets.records(&arg.left)?.to_vec();
    let left = player_rates(&left_records, &arg.left, &arg.left_player, arg.left_minutes, &profile)?;
    let right_records = datasets.records(&arg.right)?;
    let right = player_rates(right_records, &arg.right, &arg.right_player, arg.right_minutes, &profile)?;

    let metrics = if arg.metrics.is_empty() {
        let mut names = profile.derived_names();
        names.push(MINUTES_METRIC.to_owned());
        names
    } else {
        arg.metrics.clone()
    };
    let metrics = metrics.iter().map(String::as_str).collect::<Vec<_>>();
    let comparison = compare(&left.select(&metrics), &right.select(&metrics))?;

    let table = comparison_table(&comparison, &metrics);
    util::emit(global, &[table], &comparison)
}

fn player_rates(
    records: &[Record],
    dataset: &DatasetArg,
    player: &str,
    minutes: Option<f64>,
    profile: &MetricProfile,
) -> anyhow::Result<Summary> {
    let candidate = util::resolve_player(records, player)?;
    info!("Resolved '{player}' in {dataset} to {} ({})", candidate.name, candidate.entity);

    let mut exposure = ExposureTable::estimate_from_events(records);
    if let Some(minutes) = minutes {
        exposure.insert(candidate.entity.clone(), minutes);
    }
    let report = EntityReport::build(
        &dataset.to_string(),
        records,
        std::slice::from_ref(&candidate.entity),
        profile,
        &exposure,
    );
    Ok(report.rates)
}

/// One row per metric, the two players side by side.
fn comparison_table(comparison: &Comparison, metric_order: &[&str]) -> Table {
    let [left, right] = [0, 1].map(|i| {
        comparison
            .rows()
            .get(i)
            .map_or_else(String::new, |row| format!("{} ({})", row.label, row.source))
    });
    let mut table = Table::new("Per-90 comparison", ["metric".to_owned(), left, right]);
    for metric in metric_order {
        let values = comparison.for_metric(metric).map(|row| row.value).collect::<Vec<_>>();
        if let [left, right] = values.as_slice() {
            table.push_row([Cell::from(*metric), Cell::from(*left), Cell::from(*right)]);
        }
    }
    table
}
