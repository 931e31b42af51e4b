//! Metric profiles
//!
//! A [`MetricProfile`] lists the metrics to aggregate from records and the
//! metrics to derive from them. Profiles are plain JSON, so analyses can be
//! changed without recompiling:
//!
//! ```json
//! {
//!   "metrics": [
//!     { "name": "shots", "reduction": "count",
//!       "only": { "kind": "category", "name": "Shot" } },
//!     { "name": "xg", "measure": "xg", "reduction": "sum",
//!       "only": { "kind": "category", "name": "Shot" } }
//!   ],
//!   "derived": [
//!     { "kind": "per_90", "metric": "shots" },
//!     { "kind": "per_90", "metric": "xg" },
//!     { "kind": "percentage", "name": "xg_per_shot_pct",
//!       "numerator": "xg", "denominator": "shots" }
//!   ]
//! }
//! ```

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{aggregate::MetricSpec, filter::Predicate, normalize::DerivedMetric};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ProfileError {
    #[display("failed to read profile {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("failed to parse profile {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("metric '{name}' is defined more than once")]
    DuplicateMetric { name: String },
    #[display("derived metric '{derived}' reads unknown metric '{name}'")]
    UnknownMetric { derived: String, name: String },
}

/// Metrics to aggregate and derive for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricProfile {
    pub metrics: Vec<MetricSpec>,
    #[serde(default)]
    pub derived: Vec<DerivedMetric>,
}

impl MetricProfile {
    /// Parses and validates a profile.
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json).map_err(|source| ProfileError::Json {
            path: PathBuf::from("<string>"),
            source,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads, parses and validates a profile file.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_owned(),
            source,
        })?;
        let profile: Self = serde_json::from_str(&json).map_err(|source| ProfileError::Json {
            path: path.to_owned(),
            source,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks that output names are unique and that derived metrics only read
    /// aggregated metrics or metrics derived before them.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let mut names = BTreeSet::new();
        for metric in &self.metrics {
            if !names.insert(metric.name.clone()) {
                return Err(ProfileError::DuplicateMetric {
                    name: metric.name.clone(),
                });
            }
        }
        for derived in &self.derived {
            if let Some(unknown) = derived
                .inputs()
                .into_iter()
                .find(|input| !names.contains(*input))
            {
                return Err(ProfileError::UnknownMetric {
                    derived: derived.name(),
                    name: unknown.to_owned(),
                });
            }
            let name = derived.name();
            if !names.insert(name.clone()) {
                return Err(ProfileError::DuplicateMetric { name });
            }
        }
        Ok(())
    }

    /// Names of the derived metrics, in profile order.
    #[must_use]
    pub fn derived_names(&self) -> Vec<String> {
        self.derived.iter().map(DerivedMetric::name).collect()
    }

    /// Per-player event metrics: volume, chance creation and ball progression.
    ///
    /// The per-90 rates of key passes, progressive carries, passes into the
    /// penalty area, xG, xA and xG+xA make up the radar chart categories.
    #[must_use]
    pub fn events_default() -> Self {
        let shot = || Predicate::category("Shot");
        let pass = || Predicate::category("Pass");
        let dribble = || Predicate::category("Dribble");
        let carry = || Predicate::category("Carry");

        let metrics = vec![
            MetricSpec::count("shots").with_filter(shot()),
            MetricSpec::count("goals").with_filter(shot().and(Predicate::outcome("Goal"))),
            MetricSpec::count("dribbles").with_filter(dribble()),
            MetricSpec::count("successful_dribbles")
                .with_filter(dribble().and(Predicate::outcome("Complete"))),
            MetricSpec::count("key_passes").with_filter(pass().and(Predicate::flag("shot_assist"))),
            MetricSpec::count("progressive_carries").with_filter(
                carry()
                    .and(Predicate::difference("end_x", "x", 5.0))
                    .and(Predicate::measure_range("y", Some(20.0), Some(80.0))),
            ),
            MetricSpec::count("passes_into_penalty_area").with_filter(
                pass()
                    .and(Predicate::measure_range("end_x", Some(102.0), None))
                    .and(Predicate::measure_range("end_y", Some(18.0), Some(62.0))),
            ),
            MetricSpec::sum("xg", "xg").with_filter(shot()),
            MetricSpec::sum("xa", "xa").with_filter(pass()),
        ];
        let mut derived = [
            "shots",
            "goals",
            "dribbles",
            "successful_dribbles",
            "key_passes",
            "progressive_carries",
            "passes_into_penalty_area",
            "xg",
            "xa",
        ]
        .into_iter()
        .map(DerivedMetric::per_90)
        .collect::<Vec<_>>();
        derived.push(DerivedMetric::sum("xg_plus_xa", ["xg", "xa"]));
        derived.push(DerivedMetric::per_90("xg_plus_xa"));
        derived.push(DerivedMetric::percentage(
            "dribble_success_pct",
            "successful_dribbles",
            "dribbles",
        ));
        Self { metrics, derived }
    }

    /// Team totals: shots, goals and xG, with conversion rate.
    #[must_use]
    pub fn team_default() -> Self {
        let shot = || Predicate::category("Shot");
        Self {
            metrics: vec![
                MetricSpec::count("shots").with_filter(shot()),
                MetricSpec::count("goals").with_filter(shot().and(Predicate::outcome("Goal"))),
                MetricSpec::sum("xg", "xg").with_filter(shot()),
            ],
            derived: vec![DerivedMetric::percentage("conversion_pct", "goals", "shots")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        MetricProfile::events_default().validate().unwrap();
        MetricProfile::team_default().validate().unwrap();
        let names = MetricProfile::events_default().derived_names();
        assert!(names.contains(&"progressive_carries_per_90".to_owned()));
        assert!(names.contains(&"xg_plus_xa_per_90".to_owned()));
        assert_eq!(names.last().map(String::as_str), Some("dribble_success_pct"));
    }

    #[test]
    fn test_module_doc_profile_loads() {
        let doc = include_str!("profile.rs")
            .lines()
            .take_while(|line| line.starts_with("//!"))
            .map(|line| line.trim_start_matches("//!").trim_start_matches(' '))
            .collect::<Vec<_>>()
            .join("\n");
        let json = doc
            .split("```json")
            .nth(1)
            .and_then(|rest| rest.split("```").next())
            .unwrap();
        let profile = MetricProfile::from_json_str(json).unwrap();
        assert_eq!(
            profile.derived_names(),
            ["shots_per_90", "xg_per_90", "xg_per_shot_pct"]
        );
    }

    #[test]
    fn test_derived_may_read_earlier_derived() {
        let chained = MetricProfile {
            metrics: vec![MetricSpec::sum("xg", "xg"), MetricSpec::sum("xa", "xa")],
            derived: vec![
                DerivedMetric::sum("xg_plus_xa", ["xg", "xa"]),
                DerivedMetric::per_90("xg_plus_xa"),
            ],
        };
        chained.validate().unwrap();

        let reversed = MetricProfile {
            derived: chained.derived.iter().rev().cloned().collect(),
            ..chained
        };
        assert!(matches!(
            reversed.validate(),
            Err(ProfileError::UnknownMetric { name, .. }) if name == "xg_plus_xa"
        ));
    }

    #[test]
    fn test_defaults_survive_json() {
        let profile = MetricProfile::events_default();
        let json = serde_json::to_string_pretty(&profile).unwrap();
        assert_eq!(MetricProfile::from_json_str(&json).unwrap(), profile);
    }

    #[test]
    fn test_parse_documented_example() {
        let profile = MetricProfile::from_json_str(
            r#"{
                "metrics": [
                    { "name": "shots", "reduction": "count",
                      "only": { "kind": "category", "name": "Shot" } },
                    { "name": "xg", "measure": "xg", "reduction": "sum" }
                ],
                "derived": [{ "kind": "per_90", "metric": "xg" }]
            }"#,
        )
        .unwrap();
        assert_eq!(profile.metrics[0], MetricSpec::count("shots").with_filter(Predicate::category("Shot")));
        assert_eq!(profile.derived_names(), ["xg_per_90"]);
    }

    #[test]
    fn test_validation_errors() {
        let duplicate = MetricProfile {
            metrics: vec![MetricSpec::count("shots"), MetricSpec::count("shots")],
            derived: vec![],
        };
        assert!(matches!(
            duplicate.validate(),
            Err(ProfileError::DuplicateMetric { name }) if name == "shots"
        ));

        let unknown = MetricProfile {
            metrics: vec![MetricSpec::count("shots")],
            derived: vec![DerivedMetric::per_90("goals")],
        };
        assert!(matches!(
            unknown.validate(),
            Err(ProfileError::UnknownMetric { name, .. }) if name == "goals"
        ));

        let clash = MetricProfile {
            metrics: vec![MetricSpec::count("shots"), MetricSpec::count("shots_per_90")],
            derived: vec![DerivedMetric::per_90("shots")],
        };
        assert!(matches!(clash.validate(), Err(ProfileError::DuplicateMetric { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MetricProfile::load(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(matches!(err, ProfileError::Io { .. }));
    }
}
