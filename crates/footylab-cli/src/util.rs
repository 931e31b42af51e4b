use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use chrono::TimeDelta;
use footylab_pipeline::{
    cache::RecordCache,
    matching::{Candidate, NameIndex},
    profile::MetricProfile,
    record::Record,
    source::{FileSource, Query},
};

use crate::{command::GlobalArg, table::Table};

/// How long a loaded dataset is reused within one run.
const CACHE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables
    Table,
    /// Pretty-printed JSON
    Json,
    /// Comma-separated values, one block per table
    Csv,
}

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn from_output_path(output_path: Option<&Path>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path: path.to_owned(),
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    pub fn write_tables(&mut self, tables: &[Table]) -> anyhow::Result<()> {
        for (i, table) in tables.iter().enumerate() {
            if i > 0 {
                writeln!(self)?;
            }
            table
                .write_text(&mut *self)
                .with_context(|| format!("Failed to write table to {}", self.display_path()))?;
        }
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    pub fn write_csv(&mut self, tables: &[Table]) -> anyhow::Result<()> {
        for (i, table) in tables.iter().enumerate() {
            if i > 0 {
                writeln!(self)?;
            }
            table
                .write_csv(&mut *self)
                .with_context(|| format!("Failed to write CSV to {}", self.display_path()))?;
        }
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Writes `tables` in the requested format; JSON output uses `json` instead.
pub fn emit<T>(global: &GlobalArg, tables: &[Table], json: &T) -> anyhow::Result<()>
where
    T: serde::Serialize + ?Sized,
{
    let mut output = Output::from_output_path(global.output.as_deref())?;
    match global.format {
        OutputFormat::Table => output.write_tables(tables),
        OutputFormat::Json => output.write_json(json),
        OutputFormat::Csv => output.write_csv(tables),
    }
}

/// A dataset on the command line: `COMPETITION:SEASON`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetArg {
    pub competition: String,
    pub season: String,
}

impl DatasetArg {
    pub fn query(&self) -> Query {
        Query::competition_season(&self.competition, &self.season)
    }
}

impl fmt::Display for DatasetArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.competition, self.season)
    }
}

impl FromStr for DatasetArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (competition, season) = s
            .split_once(':')
            .with_context(|| format!("Dataset must be COMPETITION:SEASON, got '{s}'"))?;
        let (competition, season) = (competition.trim(), season.trim());
        anyhow::ensure!(
            !competition.is_empty() && !season.is_empty(),
            "Dataset must be COMPETITION:SEASON, got '{s}'"
        );
        Ok(Self {
            competition: competition.to_owned(),
            season: season.to_owned(),
        })
    }
}

/// Local datasets read through a record cache.
#[derive(Debug)]
pub struct Datasets {
    source: FileSource,
    cache: RecordCache,
}

impl Datasets {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            source: FileSource::new(data_dir),
            cache: RecordCache::new(TimeDelta::minutes(CACHE_TTL_MINUTES)),
        }
    }

    pub fn records(&mut self, dataset: &DatasetArg) -> anyhow::Result<&[Record]> {
        self.cache
            .get_or_fetch(&self.source, &dataset.query())
            .with_context(|| format!("Failed to load dataset {dataset}"))
    }
}

/// Resolves `query` to a single player of `records`.
pub fn resolve_player(records: &[Record], query: &str) -> anyhow::Result<Candidate> {
    let index = NameIndex::from_records(records);
    index
        .resolve_unique(query)
        .with_context(|| format!("Failed to resolve player '{query}'"))
}

/// Reads the profile at `path`, or returns `default` when no path is given.
pub fn load_profile(path: Option<&Path>, default: fn() -> MetricProfile) -> anyhow::Result<MetricProfile> {
    match path {
        Some(path) => MetricProfile::load(path)
            .with_context(|| format!("Failed to load metric profile {}", path.display())),
        None => Ok(default()),
    }
}
