use crate::core::cache::TtlCache;
use crate::core::catalog::{Action, QueryCatalog, QueryName};
use crate::domain::model::Table;
use crate::domain::ports::{Clock, SystemClock, Warehouse};
use crate::utils::error::{DashboardError, Result};
use std::sync::Arc;
use std::time::Duration;

/// The three cached result sets one dashboard pass renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub summary: Table,
    pub markets: Table,
    pub history: Table,
}

pub struct DashboardService<W: Warehouse> {
    warehouse: W,
    catalog: QueryCatalog,
    cache: TtlCache<QueryName, Table>,
}

impl<W: Warehouse> DashboardService<W> {
    pub fn new(warehouse: W, catalog: QueryCatalog, ttl: Duration) -> Self {
        Self::with_clock(warehouse, catalog, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        warehouse: W,
        catalog: QueryCatalog,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            warehouse,
            catalog,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    async fn cached(&self, name: QueryName) -> Result<Table> {
        self.cache
            .get_or_try_insert(name, || async {
                tracing::debug!("Cache miss for {}, querying warehouse", name);
                let table = self
                    .warehouse
                    .query(&self.catalog.statement(name, &[]))
                    .await?;
                tracing::info!("Loaded {} ({} rows)", name, table.len());
                Ok::<_, DashboardError>(table)
            })
            .await
    }

    pub async fn quality_summary(&self) -> Result<Table> {
        self.cached(QueryName::QualitySummary).await
    }

    pub async fn market_quality(&self) -> Result<Table> {
        self.cached(QueryName::MarketQuality).await
    }

    pub async fn metric_history(&self) -> Result<Table> {
        self.cached(QueryName::MetricHistory).await
    }

    /// Distinct market areas for the sidebar filter.
    pub async fn market_areas(&self) -> Result<Vec<String>> {
        let table = self.cached(QueryName::MarketAreas).await?;
        let idx = table.require_column("MARKET_AREA")?;
        Ok(table
            .rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter(|cell| !cell.is_null())
            .map(|cell| cell.to_string())
            .collect())
    }

    /// Loads summary, market and history in that order; the first failure
    /// aborts the pass.
    pub async fn load(&self) -> Result<DashboardData> {
        let summary = self.quality_summary().await?;
        let markets = self.market_quality().await?;
        let history = self.metric_history().await?;
        Ok(DashboardData {
            summary,
            markets,
            history,
        })
    }

    /// Drill-downs always hit the warehouse.
    pub async fn run_action(&self, action: Action, markets: &[String]) -> Result<Table> {
        let name = QueryName::Action(action);
        tracing::info!("Running {} for {} market(s)", name, markets.len());
        self.warehouse
            .query(&self.catalog.statement(name, markets))
            .await
    }

    pub async fn query(&self, name: QueryName, markets: &[String]) -> Result<Table> {
        match name {
            QueryName::Action(action) => self.run_action(action, markets).await,
            cached => self.cached(cached).await,
        }
    }

    pub fn refresh(&self) {
        tracing::info!("Clearing {} cached result(s)", self.cache.len());
        self.cache.clear();
    }
}
