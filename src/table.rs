use std::vec::IntoIter;

use tracing::info;

use crate::error::{Result, ScrapeError};
use crate::parser::extract::{Columns, Value};
use crate::parser::rules::Field;

/// Output columns, in file order.
pub const COLUMNS: [(&str, Field); 8] = [
    ("Movie Title", Field::Title),
    ("Year", Field::Year),
    ("Score", Field::Score),
    ("Adjusted Score", Field::AdjustedScore),
    ("Director", Field::Director),
    ("Synopsis", Field::Synopsis),
    ("Cast", Field::Cast),
    ("Consensus", Field::Consensus),
];

pub const CAST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub year: i64,
    pub score: i64,
    pub adjusted_score: f64,
    pub director: Option<String>,
    pub synopsis: String,
    pub cast: Vec<String>,
    pub consensus: String,
}

/// A rendered cell, shared by every exporter.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Empty,
}

impl Cell {
    /// Plain-text form used by CSV and the preview table.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(f) => format_float(*f),
            Cell::Empty => String::new(),
        }
    }
}

impl MovieRecord {
    pub fn cast_joined(&self) -> String {
        self.cast.join(CAST_SEPARATOR)
    }

    pub fn cell(&self, field: Field) -> Cell {
        match field {
            Field::Title => Cell::Text(self.title.clone()),
            Field::Year => Cell::Int(self.year),
            Field::Score => Cell::Int(self.score),
            Field::AdjustedScore => Cell::Float(self.adjusted_score),
            Field::Director => self
                .director
                .as_ref()
                .map(|d| Cell::Text(d.clone()))
                .unwrap_or(Cell::Empty),
            Field::Synopsis => Cell::Text(self.synopsis.clone()),
            Field::Cast => Cell::Text(self.cast_joined()),
            Field::Consensus => Cell::Text(self.consensus.clone()),
        }
    }

    /// Cells in `COLUMNS` order.
    pub fn cells(&self) -> Vec<Cell> {
        COLUMNS.iter().map(|(_, field)| self.cell(*field)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<MovieRecord>,
}

impl Table {
    #[cfg(test)]
    pub fn new(rows: Vec<MovieRecord>) -> Self {
        Table { rows }
    }

    /// Zip the extracted columns into rows by position.
    ///
    /// Every column must hold exactly one value per container; a short or
    /// long column is an error instead of a silently shifted table.
    pub fn assemble(columns: Columns) -> Result<Self> {
        let expected = columns.containers;
        for (field, values) in &columns.columns {
            if values.len() != expected {
                return Err(ScrapeError::LengthMismatch {
                    field: *field,
                    expected,
                    actual: values.len(),
                });
            }
        }

        let mut cols = Cursors::new(columns.columns);
        let mut rows = Vec::with_capacity(expected);
        for row in 0..expected {
            rows.push(MovieRecord {
                title: cols.text(Field::Title, row)?,
                year: cols.int(Field::Year, row)?,
                score: cols.int(Field::Score, row)?,
                adjusted_score: cols.float(Field::AdjustedScore, row)?,
                director: cols.optional_text(Field::Director, row)?,
                synopsis: cols.text(Field::Synopsis, row)?,
                cast: cols.list(Field::Cast, row)?,
                consensus: cols.text(Field::Consensus, row)?,
            });
        }

        info!("Assembled {} rows", rows.len());
        Ok(Table { rows })
    }

    pub fn rows(&self) -> &[MovieRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers() -> impl Iterator<Item = &'static str> {
        COLUMNS.iter().map(|(name, _)| *name)
    }
}

/// Floats keep a fractional part (`90.0`), like a data-frame export.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

struct Cursors {
    columns: Vec<(Field, IntoIter<Value>)>,
}

impl Cursors {
    fn new(columns: Vec<(Field, Vec<Value>)>) -> Self {
        Cursors {
            columns: columns.into_iter().map(|(f, v)| (f, v.into_iter())).collect(),
        }
    }

    fn next(&mut self, field: Field, row: usize) -> Result<Value> {
        let (_, values) = self
            .columns
            .iter_mut()
            .find(|(f, _)| *f == field)
            .ok_or(ScrapeError::MissingColumn(field))?;
        values.next().ok_or(ScrapeError::LengthMismatch {
            field,
            expected: row + 1,
            actual: row,
        })
    }

    fn text(&mut self, field: Field, row: usize) -> Result<String> {
        match self.next(field, row)? {
            Value::Text(s) => Ok(s),
            _ => Err(ScrapeError::ColumnType { field, row }),
        }
    }

    fn optional_text(&mut self, field: Field, row: usize) -> Result<Option<String>> {
        match self.next(field, row)? {
            Value::Text(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            _ => Err(ScrapeError::ColumnType { field, row }),
        }
    }

    fn int(&mut self, field: Field, row: usize) -> Result<i64> {
        match self.next(field, row)? {
            Value::Int(n) => Ok(n),
            _ => Err(ScrapeError::ColumnType { field, row }),
        }
    }

    fn float(&mut self, field: Field, row: usize) -> Result<f64> {
        match self.next(field, row)? {
            Value::Float(f) => Ok(f),
            _ => Err(ScrapeError::ColumnType { field, row }),
        }
    }

    fn list(&mut self, field: Field, row: usize) -> Result<Vec<String>> {
        match self.next(field, row)? {
            Value::List(items) => Ok(items),
            _ => Err(ScrapeError::ColumnType { field, row }),
        }
    }
}

// ── Tests ──
