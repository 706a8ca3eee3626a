use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Warehouse returned HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("SQL error {code} (state {sql_state}): {message}")]
    QueryError {
        code: String,
        sql_state: String,
        message: String,
    },

    #[error("Statement {handle} did not finish within {seconds}s")]
    TimeoutError { handle: String, seconds: u64 },

    #[error("Unexpected result shape: {message}")]
    SchemaError { message: String },
}

/// Coarse grouping used for exit codes and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Warehouse,
    Data,
    System,
}

impl DashboardError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::HttpError(_) | Self::HttpStatusError { .. } | Self::TimeoutError { .. } => {
                ErrorCategory::Network
            }
            Self::QueryError { .. } => ErrorCategory::Warehouse,
            Self::SerializationError(_) | Self::CsvError(_) | Self::SchemaError { .. } => {
                ErrorCategory::Data
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach the warehouse: {}", self),
            ErrorCategory::Warehouse => format!("The warehouse rejected a query: {}", self),
            ErrorCategory::Data => format!("Query result could not be read: {}", self),
            ErrorCategory::System => format!("Local system error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingConfigError { .. } => {
                "Add the missing key to the config file or set DQ_WAREHOUSE_TOKEN"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the config file against the documented [warehouse]/[objects] sections"
            }
            Self::HttpStatusError { status: 401, .. } | Self::HttpStatusError { status: 403, .. } => {
                "The access token is missing, expired or lacks the role; issue a new token"
            }
            Self::HttpError(_) | Self::HttpStatusError { .. } => {
                "Verify account_url and network access to the warehouse"
            }
            Self::TimeoutError { .. } => {
                "Increase warehouse.timeout_seconds or check the warehouse is running"
            }
            Self::QueryError { .. } | Self::SchemaError { .. } => {
                "Verify the dynamic tables exist and force a refresh, then press refresh"
            }
            Self::SerializationError(_) => "The warehouse response was not valid JSON; retry",
            Self::CsvError(_) | Self::IoError(_) => "Check the output path is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err = DashboardError::MissingConfigError {
            field: "warehouse.token".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = DashboardError::QueryError {
            code: "002003".to_string(),
            sql_state: "42S02".to_string(),
            message: "Object does not exist".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Warehouse);
        assert!(err.to_string().contains("002003"));
        assert!(err.user_friendly_message().contains("rejected"));
    }

    #[test]
    fn test_auth_failures_suggest_new_token() {
        let err = DashboardError::HttpStatusError {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert!(err.recovery_suggestion().contains("token"));
    }
}
