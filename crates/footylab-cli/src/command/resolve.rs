//! Name resolution command
//!
//! Lists the best candidates for a player query, and every player whose name
//! contains the query as typed.

use clap::Args;
use footylab_pipeline::{
    filter::{NameMatches, name_matches},
    matching::{MatchTier, NameIndex, Resolution},
};
use serde::Serialize;
use tracing::info;

use crate::{
    command::GlobalArg,
    table::{Cell, Table},
    util::{DatasetArg, Datasets, emit},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct ResolveArg {
    /// Dataset to search (COMPETITION:SEASON)
    pub dataset: DatasetArg,
    /// Player name, full or partial
    pub query: String,
    /// Fail unless exactly one player is the best match
    #[arg(long)]
    pub unique: bool,
}

#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    resolution: &'a Resolution,
    containing: &'a NameMatches,
}

pub(crate) fn run(global: &GlobalArg, arg: &ResolveArg) -> anyhow::Result<()> {
    let mut datasets = Datasets::new(&global.data_dir);
    let records = datasets.records(&arg.dataset)?;
    let index = NameIndex::from_records(records);
    info!("Indexed {} names from {}", index.len(), arg.dataset);

    if arg.unique {
        index.resolve_unique(&arg.query)?;
    }
    let resolution = index.resolve(&arg.query);
    let containing = name_matches(records, &arg.query);

    let tables = [candidate_table(&resolution), containing_table(&containing)];
    let report = ResolveReport {
        resolution: &resolution,
        containing: &containing,
    };
    emit(global, &tables, &report)
}

fn candidate_table(resolution: &Resolution) -> Table {
    let mut table = Table::new(
        format!("Candidates for '{}'", resolution.query),
        ["entity", "name", "match", "distance"],
    );
    for candidate in &resolution.candidates {
        let tier = match candidate.tier {
            MatchTier::Exact => "exact",
            MatchTier::Tokens => "tokens",
            MatchTier::Fuzzy => "fuzzy",
        };
        table.push_row([
            Cell::from(candidate.entity.to_string()),
            Cell::from(candidate.name.as_str()),
            Cell::from(tier),
            Cell::from(candidate.distance),
        ]);
    }
    table
}

fn containing_table(matches: &NameMatches) -> Table {
    let mut table = Table::new(
        format!("Names containing '{}'", matches.query),
        ["entity", "names"],
    );
    for (entity, names) in &matches.entities {
        let names = names.iter().map(String::as_str).collect::<Vec<_>>().join(" / ");
        table.push_row([Cell::from(entity.to_string()), Cell::from(names)]);
    }
    table
}
