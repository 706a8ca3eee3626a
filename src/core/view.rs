//! Display-ready sections derived from the cached result sets.
//!
//! Nothing here talks to the warehouse; both the text renderer and the
//! terminal UI draw from a [`DashboardView`].

use crate::core::catalog::QueryCatalog;
use crate::core::service::DashboardData;
use crate::domain::model::{Cell, QualitySummary, ScoreBand, Table};
use crate::utils::error::{DashboardError, Result};
use crate::utils::format::{format_percent, format_thousands};

pub const NO_HISTORY_NOTICE: &str = "No DMF execution history available yet.";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    pub delta: Option<String>,
    pub band: Option<ScoreBand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueBreakdown {
    pub nulls: Table,
    pub blanks: Table,
    pub duplicate_count: i64,
}

impl IssueBreakdown {
    pub fn duplicate_notice(&self) -> String {
        format!(
            "{} records have duplicate listing IDs",
            format_thousands(self.duplicate_count)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSection {
    /// (market, quality score) in query order, lowest score first.
    pub bars: Vec<(String, f64)>,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub cards: Vec<MetricCard>,
    pub breakdown: Option<IssueBreakdown>,
    pub markets: Option<MarketSection>,
    pub history: Option<Table>,
}

impl DashboardView {
    /// `selected_markets` narrows the market chart and table; empty keeps all.
    pub fn build(data: &DashboardData, selected_markets: &[String]) -> Result<Self> {
        let summary = QualitySummary::from_table(&data.summary)?;

        Ok(Self {
            cards: summary.as_ref().map(metric_cards).unwrap_or_default(),
            breakdown: summary.as_ref().map(issue_breakdown),
            markets: market_section(&data.markets, selected_markets)?,
            history: history_section(&data.history),
        })
    }
}

pub fn metric_cards(summary: &QualitySummary) -> Vec<MetricCard> {
    let band = summary.band();
    vec![
        MetricCard {
            label: "Overall Quality Score",
            value: format_percent(summary.quality_score, 1),
            delta: Some(band.label().to_string()),
            band: Some(band),
        },
        MetricCard {
            label: "Total Records",
            value: format_thousands(summary.total_records),
            delta: None,
            band: None,
        },
        MetricCard {
            label: "Total Issues",
            value: format_thousands(summary.total_issues),
            delta: Some(if summary.total_issues > 0 {
                format!("-{}", summary.total_issues)
            } else {
                "Clean".to_string()
            }),
            band: None,
        },
        MetricCard {
            label: "Issue Rate",
            value: format_percent(summary.issue_rate(), 2),
            delta: None,
            band: None,
        },
    ]
}

fn count_table(rows: &[(&str, i64)]) -> Table {
    Table::with_rows(
        vec!["Column".to_string(), "Count".to_string()],
        rows.iter()
            .map(|(name, count)| vec![Cell::Text((*name).to_string()), Cell::Int(*count)])
            .collect(),
    )
}

pub fn issue_breakdown(summary: &QualitySummary) -> IssueBreakdown {
    IssueBreakdown {
        nulls: count_table(&[
            ("Price", summary.null_price_count),
            ("Address", summary.null_address_count),
            ("Market Area", summary.null_market_area_count),
        ]),
        blanks: count_table(&[
            ("Property Type", summary.blank_property_type_count),
            ("Listing Status", summary.blank_listing_status_count),
        ]),
        duplicate_count: summary.duplicate_id_count,
    }
}

fn market_section(markets: &Table, selected: &[String]) -> Result<Option<MarketSection>> {
    if markets.is_empty() {
        return Ok(None);
    }

    let area_idx = markets.require_column("MARKET_AREA")?;
    let score_idx = markets.require_column("MARKET_QUALITY_SCORE")?;

    let filtered = if selected.is_empty() {
        markets.clone()
    } else {
        markets.filter_rows(|row| {
            row.get(area_idx)
                .map(|cell| selected.iter().any(|m| *m == cell.to_string()))
                .unwrap_or(false)
        })
    };

    let bars = filtered
        .rows
        .iter()
        .map(|row| {
            let market = row
                .get(area_idx)
                .map(|c| c.to_string())
                .unwrap_or_default();
            let score = row.get(score_idx).and_then(Cell::as_f64).unwrap_or(0.0);
            (market, score)
        })
        .collect();

    let mut table = filtered
        .select(&[
            "MARKET_AREA",
            "TOTAL_LISTINGS",
            "MARKET_QUALITY_SCORE",
            "AVG_PRICE",
            "NULL_PRICES",
            "BLANK_TYPES",
        ])?
        .rename(&[
            ("MARKET_AREA", "Market"),
            ("TOTAL_LISTINGS", "Listings"),
            ("MARKET_QUALITY_SCORE", "Quality %"),
            ("AVG_PRICE", "Avg Price"),
            ("NULL_PRICES", "Null Prices"),
            ("BLANK_TYPES", "Blank Types"),
        ]);
    // Scores and prices read as two-decimal figures.
    for cell in table.rows.iter_mut().flatten() {
        if let Cell::Float(v) = cell {
            *cell = Cell::Text(format!("{:.2}", v));
        }
    }

    Ok(Some(MarketSection { bars, table }))
}

fn history_section(history: &Table) -> Option<Table> {
    if history.is_empty() {
        return None;
    }
    Some(history.clone().rename(&[
        ("TABLE_NAME", "Table"),
        ("COLUMN_NAME", "Column"),
        ("METRIC_NAME", "Metric"),
        ("METRIC_VALUE", "Value"),
        ("EXECUTION_TIME", "Executed At"),
    ]))
}

/// What the user sees instead of the dashboard when a load pass fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    pub message: String,
    pub suggestion: String,
    pub steps: Vec<String>,
}

impl ErrorPanel {
    pub fn from_error(error: &DashboardError, catalog: &QueryCatalog) -> Self {
        Self {
            message: format!("Error loading data: {}", error),
            suggestion: error.recovery_suggestion().to_string(),
            steps: catalog.troubleshooting_steps(),
        }
    }
}
