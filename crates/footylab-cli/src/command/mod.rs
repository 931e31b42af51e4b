use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use self::{
    compare::CompareArg, percentiles::PercentilesArg, resolve::ResolveArg, salary::SalaryArg,
    team_stats::TeamStatsArg,
};
use crate::util::OutputFormat;

mod compare;
mod percentiles;
mod resolve;
mod salary;
mod team_stats;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(flatten)]
    global: GlobalArg,
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Args)]
pub(crate) struct GlobalArg {
    /// Root directory of the local datasets (`<competition>/<season>.json|csv`)
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Write output to this file instead of stdout
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); `RUST_LOG` overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Compare two players from two datasets on per-90 metrics
    Compare(#[clap(flatten)] CompareArg),
    /// Player and team shot, goal and xG tables with conversion rate
    TeamStats(#[clap(flatten)] TeamStatsArg),
    /// Percentile ranks of players against a position population
    Percentiles(#[clap(flatten)] PercentilesArg),
    /// Salary and goals join, regression line and mean salary by age
    Salary(#[clap(flatten)] SalaryArg),
    /// List the entities a player name may refer to
    Resolve(#[clap(flatten)] ResolveArg),
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.global.verbose);
    match &args.mode {
        Mode::Compare(arg) => compare::run(&args.global, arg)?,
        Mode::TeamStats(arg) => team_stats::run(&args.global, arg)?,
        Mode::Percentiles(arg) => percentiles::run(&args.global, arg)?,
        Mode::Salary(arg) => salary::run(&args.global, arg)?,
        Mode::Resolve(arg) => resolve::run(&args.global, arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_cli_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = CommandArgs::try_parse_from([
            "footylab",
            "resolve",
            "11:37",
            "messi",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.global.format, OutputFormat::Json);
        assert_eq!(args.global.verbose, 2);
        assert!(matches!(args.mode, Mode::Resolve(_)));
    }
}
