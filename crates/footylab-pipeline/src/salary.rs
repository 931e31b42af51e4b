//! Salary and performance join for league player-seasons
//!
//! Joins per-season salary lines with per-season goal totals and player
//! information, so that pay can be related to output and age.
//!
//! # Workflow
//!
//! ```text
//! salaries.csv ─┐
//!               ├─ inner join on (player_id, team_id, season) ─┐
//! goals.csv ────┘                                              ├─ left join on player_id ─► PlayerSeason
//! players.csv ─────────────────────────────────────────────────┘        (+ team names)
//! ```
//!
//! Player-seasons missing a salary, a goal total or an age are dropped.

use std::{collections::HashMap, path::Path};

use chrono::NaiveDate;
use footylab_stats::regression::LinearFit;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    aggregate::{Aggregation, GroupBy, MetricSpec},
    record::{EntityKey, Record},
    source::{SourceError, read_csv_rows},
    summary::Summary,
};

/// One salary line per player, team and season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRow {
    pub player_id: String,
    pub team_id: String,
    #[serde(rename = "season_name")]
    pub season: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub base_salary: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub guaranteed_compensation: Option<f64>,
}

/// Goal totals per player, team and season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsRow {
    pub player_id: String,
    pub team_id: String,
    #[serde(rename = "season_name")]
    pub season: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub goals: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub xgoals: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: String,
    #[serde(default)]
    pub player_name: Option<String>,
    /// Unparseable dates are read as missing
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub team_id: String,
    pub team_name: String,
}

/// A player's salary and output for one season at one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeason {
    pub player_id: String,
    pub player_name: Option<String>,
    pub team_id: String,
    pub team_name: Option<String>,
    pub season: String,
    pub base_salary: f64,
    pub guaranteed_compensation: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub age_in_season: i32,
    pub xgoals: Option<f64>,
    pub goals: f64,
}

impl PlayerSeason {
    /// The player-season as a record, with salary, goals and age as measures.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(EntityKey::new(self.player_id.clone()), "PlayerSeason")
            .with_measure("base_salary", self.base_salary)
            .with_measure("goals", self.goals)
            .with_measure("age_in_season", f64::from(self.age_in_season));
        record.name.clone_from(&self.player_name);
        record.team.clone_from(&self.team_name);
        if let Some(xgoals) = self.xgoals {
            record.measures.insert("xgoals".to_owned(), xgoals);
        }
        if let Some(guaranteed) = self.guaranteed_compensation {
            record.measures.insert("guaranteed_compensation".to_owned(), guaranteed);
        }
        record
    }
}

/// The four tables of a salary dataset.
#[derive(Debug, Clone, Default)]
pub struct SalaryTables {
    pub salaries: Vec<SalaryRow>,
    pub goals: Vec<GoalsRow>,
    pub players: Vec<PlayerInfo>,
    pub teams: Vec<TeamInfo>,
}

impl SalaryTables {
    /// Reads `salaries.csv`, `goals.csv`, `players.csv` and `teams.csv` from `dir`.
    pub fn load(dir: &Path) -> Result<Self, SourceError> {
        let tables = Self {
            salaries: read_csv_rows(&dir.join("salaries.csv"))?,
            goals: read_csv_rows(&dir.join("goals.csv"))?,
            players: read_csv_rows(&dir.join("players.csv"))?,
            teams: read_csv_rows(&dir.join("teams.csv"))?,
        };
        info!(
            "Loaded {} salary lines, {} goal lines, {} players, {} teams from {}",
            tables.salaries.len(),
            tables.goals.len(),
            tables.players.len(),
            tables.teams.len(),
            dir.display()
        );
        Ok(tables)
    }

    #[must_use]
    pub fn merge(&self) -> Vec<PlayerSeason> {
        merge_player_seasons(&self.salaries, &self.goals, &self.players, &self.teams)
    }
}

/// Age in whole years on March 1st of the season year, rounded from `days / 365.25`.
///
/// Returns `None` if `season` does not start with a year.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use footylab_pipeline::salary::age_in_season;
///
/// let birth = NaiveDate::from_ymd_opt(1995, 11, 1).unwrap();
/// assert_eq!(age_in_season(birth, "2024"), Some(28));
/// ```
#[must_use]
pub fn age_in_season(birth_date: NaiveDate, season: &str) -> Option<i32> {
    let year = season.trim().get(..4)?.parse::<i32>().ok()?;
    let season_start = NaiveDate::from_ymd_opt(year, 3, 1)?;
    let days = (season_start - birth_date).num_days();
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let age = (days as f64 / 365.25).round() as i32;
    Some(age)
}

/// Joins salaries, goals, player info and team names into player-seasons.
///
/// Salary and goal lines are inner-joined on `(player_id, team_id, season)`.
/// Player info is left-joined on `player_id`, the last line for a player
/// winning. Rows missing a salary, a goal total or an age are dropped.
#[must_use]
pub fn merge_player_seasons(
    salaries: &[SalaryRow],
    goals: &[GoalsRow],
    players: &[PlayerInfo],
    teams: &[TeamInfo],
) -> Vec<PlayerSeason> {
    let mut goals_by_key = HashMap::<(&str, &str, &str), Vec<&GoalsRow>>::new();
    for row in goals {
        goals_by_key
            .entry((row.player_id.as_str(), row.team_id.as_str(), row.season.as_str()))
            .or_default()
            .push(row);
    }
    let players = players
        .iter()
        .map(|info| (info.player_id.as_str(), info))
        .collect::<HashMap<_, _>>();
    let teams = teams
        .iter()
        .map(|team| (team.team_id.as_str(), team.team_name.as_str()))
        .collect::<HashMap<_, _>>();

    let mut merged = Vec::new();
    let mut dropped = 0_usize;
    for salary in salaries {
        let key = (
            salary.player_id.as_str(),
            salary.team_id.as_str(),
            salary.season.as_str(),
        );
        let Some(goal_rows) = goals_by_key.get(&key) else {
            continue;
        };
        let info = players.get(salary.player_id.as_str());
        let birth_date = info.and_then(|info| info.birth_date);
        for goal_row in goal_rows {
            let age = birth_date.and_then(|birth| age_in_season(birth, &salary.season));
            let (Some(base_salary), Some(goals), Some(age)) =
                (salary.base_salary, goal_row.goals, age)
            else {
                debug!(
                    "Dropping player-season {} / {} / {}: missing salary, goals or age",
                    salary.player_id, salary.team_id, salary.season
                );
                dropped += 1;
                continue;
            };
            merged.push(PlayerSeason {
                player_id: salary.player_id.clone(),
                player_name: info.and_then(|info| info.player_name.clone()),
                team_id: salary.team_id.clone(),
                team_name: teams.get(salary.team_id.as_str()).map(|&name| name.to_owned()),
                season: salary.season.clone(),
                base_salary,
                guaranteed_compensation: salary.guaranteed_compensation,
                birth_date,
                age_in_season: age,
                xgoals: goal_row.xgoals,
                goals,
            });
        }
    }
    if dropped > 0 {
        warn!("Dropped {dropped} player-seasons with missing salary, goals or age");
    }
    merged
}

/// Least-squares line of goals on base salary.
///
/// Returns `None` with fewer than two player-seasons or when every salary is the same.
#[must_use]
pub fn salary_goal_fit(seasons: &[PlayerSeason]) -> Option<LinearFit> {
    let points = seasons
        .iter()
        .map(|season| (season.base_salary, season.goals))
        .collect::<Vec<_>>();
    LinearFit::least_squares(&points)
}

/// Mean base salary per age, keyed by the zero-padded age so rows sort numerically.
///
/// The summary has the metrics `base_salary` (mean) and `players` (count).
#[must_use]
pub fn salary_by_age(source: &str, seasons: &[PlayerSeason]) -> Summary {
    let records = seasons.iter().map(PlayerSeason::to_record).collect::<Vec<_>>();
    let by_age = GroupBy::custom(|record| {
        let age = record.measure("age_in_season")?;
        Some((EntityKey::new(format!("{age:03}")), Some(format!("{age}"))))
    });
    Aggregation::new(source, by_age)
        .metric(MetricSpec::mean("base_salary", "base_salary"))
        .metric(MetricSpec::count("players"))
        .run(&records)
}

#[cfg(test)]
mod tests {
    use crate::metric::MetricValue;

    use super::*;

    fn salary(player: &str, season: &str, base: Option<f64>) -> SalaryRow {
        SalaryRow {
            player_id: player.to_owned(),
            team_id: "t1".to_owned(),
            season: season.to_owned(),
            base_salary: base,
            guaranteed_compensation: base,
        }
    }

    fn goals(player: &str, season: &str, goals: Option<f64>) -> GoalsRow {
        GoalsRow {
            player_id: player.to_owned(),
            team_id: "t1".to_owned(),
            season: season.to_owned(),
            goals,
            xgoals: None,
        }
    }

    fn info(player: &str, name: &str, birth: Option<(i32, u32, u32)>) -> PlayerInfo {
        PlayerInfo {
            player_id: player.to_owned(),
            player_name: Some(name.to_owned()),
            birth_date: birth.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[test]
    fn test_age_in_season() {
        let birth = NaiveDate::from_ymd_opt(2000, 3, 1).unwrap();
        assert_eq!(age_in_season(birth, "2020"), Some(20));
        // 19.6 years rounds up
        let birth = NaiveDate::from_ymd_opt(2000, 8, 1).unwrap();
        assert_eq!(age_in_season(birth, "2020"), Some(20));
        assert_eq!(age_in_season(birth, "n/a"), None);
    }

    #[test]
    fn test_merge_joins_and_drops() {
        let salaries = [
            salary("p1", "2023", Some(100_000.0)),
            salary("p2", "2023", None),
            salary("p3", "2023", Some(80_000.0)),
            salary("p4", "2023", Some(90_000.0)),
            salary("p1", "2022", Some(95_000.0)),
        ];
        let goal_rows = [
            goals("p1", "2023", Some(7.0)),
            goals("p2", "2023", Some(3.0)),
            goals("p3", "2023", Some(1.0)),
            goals("p4", "2023", None),
        ];
        let players = [
            info("p1", "Old Name", Some((1990, 1, 1))),
            info("p1", "Ana", Some((1995, 5, 1))),
            info("p2", "Ben", Some((1996, 1, 1))),
            info("p3", "Cy", None),
            info("p4", "Di", Some((1999, 1, 1))),
        ];
        let teams = [TeamInfo {
            team_id: "t1".to_owned(),
            team_name: "Galaxy".to_owned(),
        }];

        let merged = merge_player_seasons(&salaries, &goal_rows, &players, &teams);
        assert_eq!(merged.len(), 1);
        let ana = &merged[0];
        assert_eq!(ana.player_name.as_deref(), Some("Ana"));
        assert_eq!(ana.team_name.as_deref(), Some("Galaxy"));
        assert_eq!(ana.age_in_season, 28);
        assert_eq!(ana.goals, 7.0);
    }

    #[test]
    fn test_fit_and_by_age() {
        let season = |id: &str, salary: f64, goals: f64, age: i32| PlayerSeason {
            player_id: id.to_owned(),
            player_name: None,
            team_id: "t".to_owned(),
            team_name: None,
            season: "2024".to_owned(),
            base_salary: salary,
            guaranteed_compensation: None,
            birth_date: None,
            age_in_season: age,
            xgoals: None,
            goals,
        };
        let seasons = [
            season("a", 100.0, 1.0, 24),
            season("b", 200.0, 2.0, 24),
            season("c", 300.0, 3.0, 31),
        ];
        let fit = salary_goal_fit(&seasons).unwrap();
        assert!((fit.slope - 0.01).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-9);

        let by_age = salary_by_age("mls", &seasons);
        assert_eq!(by_age.len(), 2);
        let young = EntityKey::from("024");
        assert_eq!(by_age.get(&young, "base_salary"), MetricValue::Defined(150.0));
        assert_eq!(by_age.get(&young, "players"), MetricValue::Defined(2.0));
        assert_eq!(by_age.row(&young).unwrap().label, "24");
    }

    #[test]
    fn test_load_tables_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, contents: &str| std::fs::write(dir.path().join(name), contents).unwrap();
        write(
            "salaries.csv",
            "player_id,team_id,season_name,base_salary,guaranteed_compensation\np1,t1,2024,120000,150000\n",
        );
        write("goals.csv", "player_id,team_id,season_name,goals,xgoals\np1,t1,2024,5,4.2\n");
        write("players.csv", "player_id,player_name,birth_date\np1,Ana,not-a-date\n");
        write("teams.csv", "team_id,team_name\nt1,Galaxy\n");

        let tables = SalaryTables::load(dir.path()).unwrap();
        assert_eq!(tables.players[0].birth_date, None);
        assert_eq!(tables.salaries[0].base_salary, Some(120_000.0));
        // No birth date means no age, so the only row is dropped.
        assert!(tables.merge().is_empty());
    }
}
