//! Salary analysis command
//!
//! Joins salary, goals and player tables, fits goals against base salary and
//! reports the mean base salary per age.

use std::path::PathBuf;

use clap::Args;
use footylab_pipeline::{
    salary::{SalaryTables, salary_by_age, salary_goal_fit},
    summary::Summary,
};
use serde::Serialize;

use crate::{
    command::GlobalArg,
    table::{Cell, Table},
    util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct SalaryArg {
    /// Directory with salaries.csv, goals.csv, players.csv and teams.csv
    /// (defaults to `<data-dir>/salaries`)
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FitReport {
    slope: f64,
    intercept: f64,
    r_squared: Option<f64>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct SalaryReport {
    player_seasons: usize,
    fit: Option<FitReport>,
    by_age: Summary,
}

pub(crate) fn run(global: &GlobalArg, arg: &SalaryArg) -> anyhow::Result<()> {
    let dir = arg
        .dir
        .clone()
        .unwrap_or_else(|| global.data_dir.join("salaries"));
    let tables = SalaryTables::load(&dir)?;
    let seasons = tables.merge();
    anyhow::ensure!(
        !seasons.is_empty(),
        "No complete player-seasons in {}",
        dir.display()
    );

    let fit = salary_goal_fit(&seasons);
    let by_age = salary_by_age(&dir.display().to_string(), &seasons);

    let mut fit_table = Table::new(
        format!("Goals vs. base salary ({} player-seasons)", seasons.len()),
        ["statistic", "value"],
    );
    match &fit {
        Some(fit) => {
            fit_table.push_row([Cell::from("slope (goals per $1)"), Cell::from(fit.slope)]);
            fit_table.push_row([
                Cell::from("slope (goals per $100k)"),
                Cell::from(fit.slope * 100_000.0),
            ]);
            fit_table.push_row([Cell::from("intercept"), Cell::from(fit.intercept)]);
            if let Some(r_squared) = fit.r_squared {
                fit_table.push_row([Cell::from("r_squared"), Cell::from(r_squared)]);
            }
        }
        None => fit_table.push_row([Cell::from("slope"), Cell::from("n/a")]),
    }

    let mut age_table = Table::new("Mean base salary by age", ["age", "players", "base_salary"]);
    for (_, row) in by_age.rows() {
        age_table.push_row([
            Cell::from(row.label.as_str()),
            Cell::from(row.metric("players")),
            Cell::from(row.metric("base_salary")),
        ]);
    }

    let report = SalaryReport {
        player_seasons: seasons.len(),
        fit: fit.map(|fit| FitReport {
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            count: fit.count,
        }),
        by_age,
    };
    util::emit(global, &[fit_table, age_table], &report)
}
