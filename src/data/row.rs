use std::collections::BTreeMap;
use std::fmt;

use super::error::LoadError;
use super::model::SubscriptionTier;
use super::month::Month;

// ---------------------------------------------------------------------------
// Cell – one untyped value as it comes out of a file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell. Every file format is first decoded into cells,
/// then each row is validated into a typed record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date kept as text, as produced by Arrow date columns.
    Date(String),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::String(s) | Cell::Date(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => Ok(()),
        }
    }
}

impl Cell {
    /// A CSV field as text. Only the empty field is special; numeric columns
    /// are parsed on access so text columns keep their exact spelling.
    pub fn from_text(s: &str) -> Cell {
        let s = s.trim();
        if s.is_empty() {
            Cell::Null
        } else {
            Cell::String(s.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Row – named cells plus typed accessors
// ---------------------------------------------------------------------------

/// One decoded row. `number` is 1-based and only used in error messages.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub number: usize,
    pub cells: BTreeMap<String, Cell>,
}

impl Row {
    pub fn new(number: usize) -> Self {
        Row {
            number,
            cells: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, cell: Cell) {
        self.cells.insert(column.into(), cell);
    }

    fn cell(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&Cell::Null)
    }

    fn invalid(&self, column: &str, reason: impl Into<String>) -> LoadError {
        LoadError::invalid(self.number, column, reason)
    }

    /// A non-empty text value. Numbers are accepted and rendered as text.
    pub fn text(&self, column: &str) -> Result<String, LoadError> {
        match self.cell(column) {
            Cell::Null => Err(self.invalid(column, "value is empty")),
            cell => Ok(cell.to_string()),
        }
    }

    /// Like [`Row::text`] but an empty or absent cell yields `""`.
    pub fn text_or_empty(&self, column: &str) -> String {
        self.cell(column).to_string()
    }

    pub fn integer(&self, column: &str) -> Result<i64, LoadError> {
        match self.cell(column) {
            Cell::Integer(i) => Ok(*i),
            Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            Cell::String(s) => {
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(i);
                }
                match s.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
                    _ => Err(self.invalid(column, format!("'{s}' is not a whole number"))),
                }
            }
            Cell::Null => Err(self.invalid(column, "value is empty")),
            other => Err(self.invalid(column, format!("'{other}' is not a whole number"))),
        }
    }

    pub fn count(&self, column: &str) -> Result<u64, LoadError> {
        let value = self.integer(column)?;
        u64::try_from(value).map_err(|_| self.invalid(column, format!("{value} is negative")))
    }

    pub fn float(&self, column: &str) -> Result<f64, LoadError> {
        self.optional_float(column)?
            .ok_or_else(|| self.invalid(column, "value is empty"))
    }

    pub fn optional_float(&self, column: &str) -> Result<Option<f64>, LoadError> {
        match self.cell(column) {
            Cell::Integer(i) => Ok(Some(*i as f64)),
            Cell::Float(f) if f.is_nan() => Ok(None),
            Cell::Float(f) => Ok(Some(*f)),
            Cell::String(s) => match s.parse::<f64>() {
                Ok(f) if f.is_nan() => Ok(None),
                Ok(f) => Ok(Some(f)),
                Err(_) => Err(self.invalid(column, format!("'{s}' is not a number"))),
            },
            Cell::Null => Ok(None),
            other => Err(self.invalid(column, format!("'{other}' is not a number"))),
        }
    }

    pub fn month(&self, column: &str) -> Result<Month, LoadError> {
        let text = self.text(column)?;
        text.parse()
            .map_err(|e: super::month::ParseMonthError| self.invalid(column, e.to_string()))
    }

    pub fn tier(&self, column: &str) -> Result<SubscriptionTier, LoadError> {
        let text = self.text(column)?;
        text.parse()
            .map_err(|_| self.invalid(column, format!("'{text}' is not Free or Premium")))
    }
}
