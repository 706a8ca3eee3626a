use crate::utils::error::{DashboardError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// A single decoded value from a warehouse result set.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            Cell::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "None"),
            Cell::Bool(v) => write!(f, "{}", v),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// An in-memory result set. Column names keep the warehouse's casing;
/// lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            DashboardError::schema(format!(
                "column {} not found (have: {})",
                name,
                self.columns.join(", ")
            ))
        })
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Keeps the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<Result<Vec<_>>>()?;

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).cloned().unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Renames columns by case-insensitive match; unknown names are ignored.
    pub fn rename(mut self, mapping: &[(&str, &str)]) -> Table {
        for column in self.columns.iter_mut() {
            if let Some((_, to)) = mapping
                .iter()
                .find(|(from, _)| column.eq_ignore_ascii_case(from))
            {
                *column = (*to).to_string();
            }
        }
        self
    }

    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }
}

/// Traffic-light classification of the overall quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Warning,
    NeedsAttention,
}

impl ScoreBand {
    pub fn classify(score: f64) -> Self {
        if score >= 90.0 {
            ScoreBand::Good
        } else if score >= 75.0 {
            ScoreBand::Warning
        } else {
            ScoreBand::NeedsAttention
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Good => "Good",
            ScoreBand::Warning => "Warning",
            ScoreBand::NeedsAttention => "Needs Attention",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percentage of records with at least one issue; 0 when there are no records.
pub fn issue_rate(total_issues: i64, total_records: i64) -> f64 {
    if total_records > 0 {
        total_issues as f64 / total_records as f64 * 100.0
    } else {
        0.0
    }
}

/// First row of the quality-summary dynamic table.
#[derive(Debug, Clone, PartialEq)]
pub struct QualitySummary {
    pub total_records: i64,
    pub null_price_count: i64,
    pub null_address_count: i64,
    pub null_market_area_count: i64,
    pub blank_property_type_count: i64,
    pub blank_listing_status_count: i64,
    pub duplicate_id_count: i64,
    pub quality_score: f64,
    pub total_issues: i64,
}

impl QualitySummary {
    pub fn from_table(table: &Table) -> Result<Option<Self>> {
        if table.is_empty() {
            return Ok(None);
        }

        let int = |name: &str| -> Result<i64> {
            table.require_column(name)?;
            match table.cell(0, name) {
                Some(Cell::Null) | None => Ok(0),
                Some(cell) => cell.as_i64().ok_or_else(|| {
                    DashboardError::schema(format!("{} is not an integer: {:?}", name, cell))
                }),
            }
        };

        table.require_column("QUALITY_SCORE")?;
        let quality_score = match table.cell(0, "QUALITY_SCORE") {
            Some(Cell::Null) | None => 0.0,
            Some(cell) => cell.as_f64().ok_or_else(|| {
                DashboardError::schema(format!("QUALITY_SCORE is not numeric: {:?}", cell))
            })?,
        };

        Ok(Some(Self {
            total_records: int("TOTAL_RECORDS")?,
            null_price_count: int("NULL_PRICE_COUNT")?,
            null_address_count: int("NULL_ADDRESS_COUNT")?,
            null_market_area_count: int("NULL_MARKET_AREA_COUNT")?,
            blank_property_type_count: int("BLANK_PROPERTY_TYPE_COUNT")?,
            blank_listing_status_count: int("BLANK_LISTING_STATUS_COUNT")?,
            duplicate_id_count: int("DUPLICATE_ID_COUNT")?,
            quality_score,
            total_issues: int("TOTAL_ISSUES")?,
        }))
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::classify(self.quality_score)
    }

    pub fn issue_rate(&self) -> f64 {
        issue_rate(self.total_issues, self.total_records)
    }
}
