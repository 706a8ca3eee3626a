use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOKEN_ENV_VAR: &str = "DQ_WAREHOUSE_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub objects: ObjectsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dashboard: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub account_url: String,
    pub token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Fully-qualified names of the warehouse objects the dashboard reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObjectsConfig {
    pub database: String,
    pub raw_schema: String,
    pub analytics_schema: String,
    pub listings_table: String,
    pub quality_summary_table: String,
    pub market_trends_table: String,
    pub metric_results_table: String,
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            database: "SNOWFLAKE_EXAMPLE".to_string(),
            raw_schema: "SFE_RAW_REALESTATE".to_string(),
            analytics_schema: "SFE_ANALYTICS_REALESTATE".to_string(),
            listings_table: "SFE_RAW_PROPERTY_LISTINGS".to_string(),
            quality_summary_table: "SFE_DT_QUALITY_SUMMARY".to_string(),
            market_trends_table: "SFE_DT_MARKET_TRENDS".to_string(),
            metric_results_table: "SFE_DQ_METRIC_RESULTS".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub title: String,
    pub subtitle: String,
    pub tick_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Data Quality Metrics Dashboard".to_string(),
            subtitle: "Real Estate Property Listings Quality Monitoring".to_string(),
            tick_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub json: bool,
}

fn default_token_type() -> String {
    "OAUTH".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl DashboardConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DashboardError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| DashboardError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;

        // Unresolved placeholders count as absent so the env fallback applies.
        if config
            .warehouse
            .token
            .as_deref()
            .is_some_and(|t| t.trim().is_empty() || t.starts_with("${"))
        {
            config.warehouse.token = None;
        }
        if config.warehouse.token.is_none() {
            config.warehouse.token = std::env::var(TOKEN_ENV_VAR).ok();
        }

        Ok(config)
    }

    /// 替換環境變數 (例如 ${SNOWFLAKE_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashboardError::ConfigError {
            message: format!("placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("warehouse.account_url", &self.warehouse.account_url)?;
        let token = validation::validate_required_field("warehouse.token", &self.warehouse.token)?;
        validation::validate_non_empty_string("warehouse.token", token)?;
        validation::validate_non_empty_string("warehouse.token_type", &self.warehouse.token_type)?;
        validation::validate_positive_number(
            "warehouse.timeout_seconds",
            self.warehouse.timeout_seconds,
            1,
        )?;
        validation::validate_positive_number(
            "warehouse.poll_interval_ms",
            self.warehouse.poll_interval_ms,
            1,
        )?;
        if let Some(wh) = &self.warehouse.warehouse {
            validation::validate_identifier("warehouse.warehouse", wh)?;
        }
        if let Some(role) = &self.warehouse.role {
            validation::validate_identifier("warehouse.role", role)?;
        }

        let objects = &self.objects;
        for (field, value) in [
            ("objects.database", &objects.database),
            ("objects.raw_schema", &objects.raw_schema),
            ("objects.analytics_schema", &objects.analytics_schema),
            ("objects.listings_table", &objects.listings_table),
            ("objects.quality_summary_table", &objects.quality_summary_table),
            ("objects.market_trends_table", &objects.market_trends_table),
            ("objects.metric_results_table", &objects.metric_results_table),
        ] {
            validation::validate_identifier(field, value)?;
        }

        validation::validate_positive_number("cache.ttl_seconds", self.cache.ttl_seconds, 1)?;
        validation::validate_positive_number("dashboard.tick_ms", self.dashboard.tick_ms, 1)?;

        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.warehouse.token.as_deref()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.warehouse.timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.warehouse.poll_interval_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.dashboard.tick_ms)
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
