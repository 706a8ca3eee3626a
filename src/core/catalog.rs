//! The fixed set of read queries the dashboard issues.
//!
//! Object names come from [`ObjectsConfig`] and are validated as bare
//! identifiers at config load; user input (market selections) only ever
//! travels as bindings.

use crate::config::ObjectsConfig;
use crate::domain::ports::Statement;
use std::fmt;

/// On-demand remediation drill-downs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NullPrices,
    BlankTypes,
    Duplicates,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[Action::NullPrices, Action::BlankTypes, Action::Duplicates]
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Action::NullPrices => "View NULL Records",
            Action::BlankTypes => "View Blank Records",
            Action::Duplicates => "View Duplicates",
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self {
            Action::NullPrices => "Get Records with NULL Prices",
            Action::BlankTypes => "Get Records with Blank Types",
            Action::Duplicates => "Get Duplicate Listing IDs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    MarketAreas,
    QualitySummary,
    MarketQuality,
    MetricHistory,
    Action(Action),
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryName::MarketAreas => "market_areas",
            QueryName::QualitySummary => "quality_summary",
            QueryName::MarketQuality => "market_quality",
            QueryName::MetricHistory => "metric_history",
            QueryName::Action(Action::NullPrices) => "null_prices",
            QueryName::Action(Action::BlankTypes) => "blank_types",
            QueryName::Action(Action::Duplicates) => "duplicates",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct QueryCatalog {
    objects: ObjectsConfig,
}

impl QueryCatalog {
    pub fn new(objects: ObjectsConfig) -> Self {
        Self { objects }
    }

    pub fn listings_table(&self) -> String {
        format!(
            "{}.{}.{}",
            self.objects.database, self.objects.raw_schema, self.objects.listings_table
        )
    }

    pub fn analytics_schema(&self) -> String {
        format!("{}.{}", self.objects.database, self.objects.analytics_schema)
    }

    pub fn quality_summary_table(&self) -> String {
        format!(
            "{}.{}",
            self.analytics_schema(),
            self.objects.quality_summary_table
        )
    }

    pub fn market_trends_table(&self) -> String {
        format!(
            "{}.{}",
            self.analytics_schema(),
            self.objects.market_trends_table
        )
    }

    pub fn metric_results_table(&self) -> String {
        format!(
            "{}.{}",
            self.analytics_schema(),
            self.objects.metric_results_table
        )
    }

    /// Builds the statement for `name`. The market selection only affects
    /// the drill-down queries.
    pub fn statement(&self, name: QueryName, markets: &[String]) -> Statement {
        match name {
            QueryName::MarketAreas => self.market_areas(),
            QueryName::QualitySummary => self.quality_summary(),
            QueryName::MarketQuality => self.market_quality(),
            QueryName::MetricHistory => self.metric_history(),
            QueryName::Action(action) => self.action(action, markets),
        }
    }

    pub fn market_areas(&self) -> Statement {
        Statement::new(format!(
            "SELECT DISTINCT COALESCE(market_area, 'Unknown') AS market_area \
             FROM {} \
             WHERE market_area IS NOT NULL \
             ORDER BY market_area",
            self.listings_table()
        ))
    }

    pub fn quality_summary(&self) -> Statement {
        Statement::new(format!(
            "SELECT total_records, null_price_count, null_address_count, \
             null_market_area_count, blank_property_type_count, \
             blank_listing_status_count, duplicate_id_count, quality_score, total_issues \
             FROM {}",
            self.quality_summary_table()
        ))
    }

    pub fn market_quality(&self) -> Statement {
        Statement::new(format!(
            "SELECT market_area, total_listings, active_listings, avg_price, median_price, \
             null_prices, blank_types, market_quality_score \
             FROM {} \
             ORDER BY market_quality_score ASC",
            self.market_trends_table()
        ))
    }

    pub fn metric_history(&self) -> Statement {
        Statement::new(format!(
            "SELECT table_name, column_name, metric_name, metric_value, execution_time \
             FROM {} \
             ORDER BY execution_time DESC \
             LIMIT 100",
            self.metric_results_table()
        ))
    }

    pub fn action(&self, action: Action, markets: &[String]) -> Statement {
        let table = self.listings_table();
        let market_filter = market_in_clause(markets);

        let sql = match action {
            Action::NullPrices => format!(
                "SELECT listing_id, address, city, market_area, price \
                 FROM {} \
                 WHERE price IS NULL{} \
                 LIMIT 100",
                table,
                market_filter
                    .as_deref()
                    .map(|f| format!(" AND {}", f))
                    .unwrap_or_default()
            ),
            Action::BlankTypes => format!(
                "SELECT listing_id, address, property_type, listing_status \
                 FROM {} \
                 WHERE TRIM(COALESCE(property_type, '')) = ''{} \
                 LIMIT 100",
                table,
                market_filter
                    .as_deref()
                    .map(|f| format!(" AND {}", f))
                    .unwrap_or_default()
            ),
            Action::Duplicates => format!(
                "SELECT listing_id, COUNT(*) AS occurrence_count \
                 FROM {}{} \
                 GROUP BY listing_id \
                 HAVING COUNT(*) > 1 \
                 ORDER BY occurrence_count DESC \
                 LIMIT 50",
                table,
                market_filter
                    .as_deref()
                    .map(|f| format!(" WHERE {}", f))
                    .unwrap_or_default()
            ),
        };

        markets
            .iter()
            .fold(Statement::new(sql), |stmt, market| stmt.bind(market.as_str()))
    }

    /// Static remediation steps shown with any load failure.
    pub fn troubleshooting_steps(&self) -> Vec<String> {
        vec![
            format!(
                "Verify deployment completed: SHOW DYNAMIC TABLES IN SCHEMA {};",
                self.analytics_schema()
            ),
            format!(
                "Force refresh if needed: ALTER DYNAMIC TABLE {} REFRESH; ALTER DYNAMIC TABLE {} REFRESH;",
                self.quality_summary_table(),
                self.market_trends_table()
            ),
            "Press the Refresh Data control after running the refresh commands.".to_string(),
        ]
    }
}

fn market_in_clause(markets: &[String]) -> Option<String> {
    if markets.is_empty() {
        return None;
    }
    let placeholders = vec!["?"; markets.len()].join(", ");
    Some(format!("market_area IN ({})", placeholders))
}
