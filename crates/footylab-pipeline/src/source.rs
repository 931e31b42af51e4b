//! Data source adapters
//!
//! The pipeline treats a data source as a collection of records addressed by a
//! [`Query`] (competition, season, ...), independent of how the records are
//! transported. [`FileSource`] reads local dataset files and
//! [`InMemorySource`] serves fixed record sets.
//!
//! # On-disk layout
//!
//! ```text
//! <root>/
//! ├── 11/             # competition
//! │   ├── 37.json     # season: JSON array of records
//! │   └── 90.csv      # season: flat CSV, used when no JSON file exists
//! └── 55/
//!     └── 282.json
//! ```
//!
//! CSV datasets have a header row. The `entity` and `category` columns are
//! required; `name`, `team`, `position`, `match_id`, `outcome` and `minute`
//! are recognized when present. Every other column is read as a numeric
//! measure, and empty cells are treated as absent values.

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::BufReader,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::record::{EntityKey, Record};

/// Ordered key/value parameters identifying a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Query {
    params: BTreeMap<String, String>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for one season of one competition.
    #[must_use]
    pub fn competition_season(competition: impl fmt::Display, season: impl fmt::Display) -> Self {
        Self::new()
            .with("competition", competition)
            .with("season", season)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn require(&self, key: &str) -> Result<&str, SourceError> {
        self.get(key).ok_or_else(|| SourceError::MissingParameter {
            name: key.to_owned(),
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SourceError {
    #[display("{dataset} has no dataset for {query}")]
    NotFound { dataset: String, query: Query },
    #[display("query is missing parameter '{name}'")]
    MissingParameter { name: String },
    #[display("{dataset} does not support query parameter '{name}'")]
    UnsupportedParameter { dataset: String, name: String },
    #[display("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("failed to parse {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("failed to parse {}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[display("{} has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[display("{}:{line}: invalid {column} value '{value}'", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}

/// A collection of records addressed by queries.
pub trait DataSource {
    /// Name used in logs, cache keys and summary labels.
    fn name(&self) -> &str;

    /// Fetches every record matching `query`.
    fn fetch(&self, query: &Query) -> Result<Vec<Record>, SourceError>;
}

/// Local dataset files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: root.display().to_string(),
            root,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dataset_path(&self, competition: &str, season: &str, ext: &str) -> PathBuf {
        self.root.join(competition).join(format!("{season}.{ext}"))
    }
}

impl DataSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    /// Supported parameters: `competition` and `season` (required), `player` (optional entity filter).
    fn fetch(&self, query: &Query) -> Result<Vec<Record>, SourceError> {
        if let Some((name, _)) = query
            .params()
            .find(|(name, _)| !matches!(*name, "competition" | "season" | "player"))
        {
            return Err(SourceError::UnsupportedParameter {
                dataset: self.name.clone(),
                name: name.to_owned(),
            });
        }
        let competition = query.require("competition")?;
        let season = query.require("season")?;

        let json_path = self.dataset_path(competition, season, "json");
        let csv_path = self.dataset_path(competition, season, "csv");
        let mut records = if json_path.is_file() {
            read_json_records(&json_path)?
        } else if csv_path.is_file() {
            read_csv_records(&csv_path)?
        } else {
            return Err(SourceError::NotFound {
                dataset: self.name.clone(),
                query: query.clone(),
            });
        };

        if let Some(player) = query.get("player") {
            records.retain(|record| record.entity.as_str() == player);
        }
        info!("Loaded {} records for {query} from {}", records.len(), self.name);
        Ok(records)
    }
}

/// Fixed record sets keyed by query.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    name: String,
    datasets: BTreeMap<Query, Vec<Record>>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datasets: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_dataset(mut self, query: Query, records: Vec<Record>) -> Self {
        self.datasets.insert(query, records);
        self
    }
}

impl DataSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, query: &Query) -> Result<Vec<Record>, SourceError> {
        self.datasets
            .get(query)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                dataset: self.name.clone(),
                query: query.clone(),
            })
    }
}

fn open(path: &Path) -> Result<fs::File, SourceError> {
    fs::File::open(path).map_err(|source| SourceError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Reads a JSON array of records.
pub fn read_json_records(path: &Path) -> Result<Vec<Record>, SourceError> {
    debug!("Reading JSON dataset {}", path.display());
    let reader = BufReader::new(open(path)?);
    serde_json::from_reader(reader).map_err(|source| SourceError::Json {
        path: path.to_owned(),
        source,
    })
}

/// Reads a CSV file whose header names match the fields of `T`.
pub fn read_csv_rows<T>(path: &Path) -> Result<Vec<T>, SourceError>
where
    T: DeserializeOwned,
{
    debug!("Reading CSV table {}", path.display());
    let csv_error = |source| SourceError::Csv {
        path: path.to_owned(),
        source,
    };
    let mut reader = csv::Reader::from_reader(open(path)?);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_error)
}

#[derive(Debug, Default)]
struct CsvColumns {
    entity: usize,
    category: usize,
    name: Option<usize>,
    team: Option<usize>,
    position: Option<usize>,
    match_id: Option<usize>,
    outcome: Option<usize>,
    minute: Option<usize>,
    measures: Vec<(usize, String)>,
}

impl CsvColumns {
    fn from_headers(path: &Path, headers: &csv::StringRecord) -> Result<Self, SourceError> {
        let mut entity = None;
        let mut category = None;
        let mut columns = Self::default();
        for (i, header) in headers.iter().enumerate() {
            match header.trim() {
                "entity" => entity = Some(i),
                "category" => category = Some(i),
                "name" => columns.name = Some(i),
                "team" => columns.team = Some(i),
                "position" => columns.position = Some(i),
                "match_id" => columns.match_id = Some(i),
                "outcome" => columns.outcome = Some(i),
                "minute" => columns.minute = Some(i),
                measure => columns.measures.push((i, measure.to_owned())),
            }
        }
        let missing = |column: &str| SourceError::MissingColumn {
            path: path.to_owned(),
            column: column.to_owned(),
        };
        columns.entity = entity.ok_or_else(|| missing("entity"))?;
        columns.category = category.ok_or_else(|| missing("category"))?;
        Ok(columns)
    }
}

struct CsvRow<'a> {
    path: &'a Path,
    record: &'a csv::StringRecord,
}

impl CsvRow<'_> {
    fn text(&self, column: Option<usize>) -> Option<String> {
        column
            .and_then(|i| self.record.get(i))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_owned)
    }

    fn parse<T: FromStr>(&self, column: Option<usize>, name: &str) -> Result<Option<T>, SourceError> {
        let Some(cell) = self.text(column) else {
            return Ok(None);
        };
        cell.parse().map(Some).map_err(|_| SourceError::InvalidValue {
            path: self.path.to_owned(),
            line: self.record.position().map_or(0, csv::Position::line),
            column: name.to_owned(),
            value: cell,
        })
    }
}

/// Reads a flat CSV dataset into records.
pub fn read_csv_records(path: &Path) -> Result<Vec<Record>, SourceError> {
    debug!("Reading CSV dataset {}", path.display());
    let csv_error = |source| SourceError::Csv {
        path: path.to_owned(),
        source,
    };
    let mut reader = csv::Reader::from_reader(open(path)?);
    let columns = CsvColumns::from_headers(path, reader.headers().map_err(csv_error)?)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let row = CsvRow { path, record: &row };
        let entity = row.text(Some(columns.entity)).unwrap_or_default();
        let category = row.text(Some(columns.category)).unwrap_or_default();
        let mut record = Record::new(EntityKey::new(entity), category);
        record.name = row.text(columns.name);
        record.team = row.text(columns.team);
        record.position = row.text(columns.position);
        record.outcome = row.text(columns.outcome);
        record.match_id = row.parse(columns.match_id, "match_id")?;
        record.minute = row.parse(columns.minute, "minute")?;
        for (i, measure) in &columns.measures {
            if let Some(value) = row.parse::<f64>(Some(*i), measure)? {
                record.measures.insert(measure.clone(), value);
            }
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_query_display() {
        let query = Query::competition_season(11, 37).with("player", 5503);
        assert_eq!(query.to_string(), "competition=11, player=5503, season=37");
        assert_eq!(query.get("season"), Some("37"));
    }

    #[test]
    fn test_file_source_json() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "11/37.json",
            r#"[{"entity": 5503, "name": "Lionel Messi", "category": "Shot", "outcome": "Goal"},
                {"entity": 5211, "category": "Pass"}]"#,
        );
        let source = FileSource::new(dir.path());
        let all = source.fetch(&Query::competition_season(11, 37)).unwrap();
        assert_eq!(all.len(), 2);
        let messi = source
            .fetch(&Query::competition_season(11, 37).with("player", 5503))
            .unwrap();
        assert_eq!(messi.len(), 1);
        assert_eq!(messi[0].display_name(), "Lionel Messi");
    }

    #[test]
    fn test_file_source_csv() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "55/282.csv",
            "entity,name,match_id,category,outcome,minute,x,end_x,xg\n\
             1,Kai,7,Carry,,12,30.5,41,\n\
             1,Kai,7,Shot,Goal,80,108,,0.4\n",
        );
        let source = FileSource::new(dir.path());
        let records = source.fetch(&Query::competition_season(55, 282)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, None);
        assert_eq!(records[0].measure("end_x"), Some(41.0));
        assert_eq!(records[0].measure("xg"), None);
        assert_eq!(records[1].match_id, Some(7));
        assert_eq!(records[1].minute, Some(80));
        assert_eq!(records[1].measure("xg"), Some(0.4));
    }

    #[test]
    fn test_file_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1/1.csv", "entity,category,minute\nA,Shot,late\n");
        write(dir.path(), "1/2.csv", "name,category\nA,Shot\n");
        let source = FileSource::new(dir.path());

        let err = source.fetch(&Query::competition_season(1, 1)).unwrap_err();
        assert!(
            matches!(&err, SourceError::InvalidValue { line: 2, column, value, .. } if column == "minute" && value == "late"),
            "{err:?}"
        );
        let err = source.fetch(&Query::competition_season(1, 2)).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { ref column, .. } if column == "entity"));
        let err = source.fetch(&Query::competition_season(1, 3)).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
        let err = source.fetch(&Query::new().with("competition", 1)).unwrap_err();
        assert!(matches!(err, SourceError::MissingParameter { ref name } if name == "season"));
        let err = source
            .fetch(&Query::competition_season(1, 1).with("team", "x"))
            .unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedParameter { .. }));
    }

    #[test]
    fn test_in_memory_source() {
        let query = Query::competition_season(43, 3);
        let source = InMemorySource::new("memory")
            .with_dataset(query.clone(), vec![Record::new("A", "Shot")]);
        assert_eq!(source.fetch(&query).unwrap().len(), 1);
        assert!(matches!(
            source.fetch(&Query::competition_season(43, 4)),
            Err(SourceError::NotFound { .. })
        ));
    }
}
