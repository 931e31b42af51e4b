//! Team statistics command
//!
//! Aggregates shot events per player and per team and ranks both by goals.

use std::path::PathBuf;

use clap::Args;
use footylab_pipeline::{
    aggregate::{Aggregation, GroupBy},
    exposure::ExposureTable,
    normalize::derive,
    profile::MetricProfile,
    summary::{Summary, SummaryRow},
};
use footylab_stats::descriptive::DescriptiveStats;
use serde::Serialize;

use crate::{
    command::GlobalArg,
    table::{Cell, Table},
    util::{self, DatasetArg, Datasets},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct TeamStatsArg {
    /// Dataset to analyze (COMPETITION:SEASON)
    pub dataset: DatasetArg,

    /// Metric profile JSON file (defaults to shots, goals, xG and conversion rate)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Metric to rank players and teams by
    #[arg(long, default_value = "goals")]
    pub rank_by: String,

    /// Number of players to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Serialize)]
struct TeamStatsReport<'a> {
    players: &'a Summary,
    teams: &'a Summary,
}

pub(crate) fn run(global: &GlobalArg, arg: &TeamStatsArg) -> anyhow::Result<()> {
    let profile = util::load_profile(arg.profile.as_deref(), MetricProfile::team_default)?;
    let mut datasets = Datasets::new(&global.data_dir);
    let records = datasets.records(&arg.dataset)?;
    let source = arg.dataset.to_string();

    let summarize = |group_by| {
        let totals = Aggregation::new(source.clone(), group_by)
            .metrics(profile.metrics.iter().cloned())
            .run(records);
        // percentages do not need exposure; per-90 metrics stay undefined here
        let derived = derive(&totals, &ExposureTable::new(), &profile.derived);
        totals.merge_metrics(&derived)
    };
    let players = summarize(GroupBy::Entity);
    let teams = summarize(GroupBy::Team);

    let mut columns = vec!["name".to_owned()];
    columns.extend(profile.metrics.iter().map(|metric| metric.name.clone()));
    columns.extend(profile.derived_names());

    let player_rows = players.top(&arg.rank_by, arg.top);
    let player_table = summary_table(
        format!("Top {} players by {}", player_rows.len(), arg.rank_by),
        &columns,
        player_rows.into_iter().map(|(_, row)| row),
    );
    let team_table = summary_table(
        format!("Teams by {}", arg.rank_by),
        &columns,
        teams.rank_by(&arg.rank_by).into_iter().map(|(_, row)| row),
    );

    let mut tables = vec![player_table, team_table];
    let team_values = teams
        .rows()
        .filter_map(|(_, row)| row.metric(&arg.rank_by).as_defined());
    if let Some(stats) = DescriptiveStats::new(team_values) {
        let mut overview = Table::new(format!("{} per team", arg.rank_by), ["statistic", "value"]);
        overview.push_row([Cell::from("teams"), Cell::from(stats.count)]);
        overview.push_row([Cell::from("most"), Cell::from(stats.max)]);
        overview.push_row([Cell::from("fewest"), Cell::from(stats.min)]);
        overview.push_row([Cell::from("mean"), Cell::from(stats.mean)]);
        overview.push_row([Cell::from("median"), Cell::from(stats.median)]);
        tables.push(overview);
    }

    let report = TeamStatsReport {
        players: &players,
        teams: &teams,
    };
    util::emit(global, &tables, &report)
}

fn summary_table<'a, I>(title: String, columns: &[String], rows: I) -> Table
where
    I: IntoIterator<Item = &'a SummaryRow>,
{
    let mut table = Table::new(title, columns.iter().cloned());
    for row in rows {
        let mut cells = vec![Cell::from(row.label.clone())];
        cells.extend(columns[1..].iter().map(|metric| Cell::from(row.metric(metric))));
        table.push_row(cells);
    }
    table
}
