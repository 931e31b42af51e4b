//! Text, CSV and JSON rendering of result tables

use std::io;

use footylab_pipeline::metric::{MetricValue, UndefinedMetric};
use serde::Serialize;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Undefined { undefined: UndefinedMetric },
}

impl Cell {
    fn to_text(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => format!("{n:.2}"),
            Cell::Undefined { .. } => "n/a".to_string(),
        }
    }

    fn to_csv(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Undefined { .. } => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_owned())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<usize> for Cell {
    #[expect(clippy::cast_precision_loss)]
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<MetricValue> for Cell {
    fn from(value: MetricValue) -> Self {
        match value {
            MetricValue::Defined(n) => Cell::Number(n),
            MetricValue::Undefined(undefined) => Cell::Undefined { undefined },
        }
    }
}

/// A titled table with a header row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(title: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, C>(&mut self, row: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Writes the title, the header, a separator and the rows.
    ///
    /// The first column is left-aligned and the others right-aligned.
    pub fn write_text<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: io::Write,
    {
        let cells = self
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::to_text).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let widths = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain([header.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect::<Vec<_>>();

        writeln!(writer, "{}", self.title)?;
        writeln!(writer, "{}", "=".repeat(self.title.chars().count()))?;
        let line = |writer: &mut W, values: &[String]| -> io::Result<()> {
            write!(writer, " ")?;
            for (i, (value, width)) in values.iter().zip(&widths).enumerate() {
                if i == 0 {
                    write!(writer, " {value:<width$}")?;
                } else {
                    write!(writer, " {value:>width$}")?;
                }
            }
            writeln!(writer)
        };
        line(&mut writer, self.columns.as_slice())?;
        let total_width = widths.iter().sum::<usize>() + widths.len();
        writeln!(writer, "  {}", "-".repeat(total_width.saturating_sub(1)))?;
        for row in &cells {
            line(&mut writer, row.as_slice())?;
        }
        Ok(())
    }

    pub fn write_csv<W>(&self, writer: W) -> csv::Result<()>
    where
        W: io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::to_csv))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut table = Table::new("Goals", ["player", "goals_per_90"]);
        table.push_row([Cell::from("Messi"), Cell::from(0.8)]);
        table.push_row([
            Cell::from("Nobody"),
            Cell::from(MetricValue::Undefined(UndefinedMetric::MissingExposure)),
        ]);
        table
    }

    #[test]
    fn test_text_rendering() {
        let mut out = Vec::new();
        table().write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Goals");
        assert_eq!(lines[2], "  player goals_per_90");
        assert_eq!(lines[3], format!("  {}", "-".repeat(19)));
        assert_eq!(lines[4], format!("  Messi {}0.80", " ".repeat(9)));
        assert_eq!(lines[5], format!("  Nobody{}n/a", " ".repeat(10)));
    }

    #[test]
    fn test_csv_leaves_undefined_empty() {
        let mut out = Vec::new();
        table().write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "player,goals_per_90\nMessi,0.8\nNobody,\n"
        );
    }

    #[test]
    fn test_json_keeps_undefined_reason() {
        let json = serde_json::to_value(table()).unwrap();
        assert_eq!(json["rows"][0][1], 0.8);
        assert_eq!(json["rows"][1][1]["undefined"], "missing_exposure");
    }
}
