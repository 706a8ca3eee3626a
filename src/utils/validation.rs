use crate::utils::error::{DashboardError, Result};
use regex::Regex;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DashboardError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| DashboardError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Object names are spliced into SQL text, so only bare identifiers pass.
pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").map_err(|e| DashboardError::ConfigError {
        message: format!("identifier pattern: {}", e),
    })?;

    if !re.is_match(value) {
        return Err(DashboardError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Must be an unquoted SQL identifier (letters, digits, _ or $)".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("account_url", "https://example.com").is_ok());
        assert!(validate_url("account_url", "http://example.com").is_ok());
        assert!(validate_url("account_url", "").is_err());
        assert!(validate_url("account_url", "invalid-url").is_err());
        assert!(validate_url("account_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("cache.ttl_seconds", 60, 1).is_ok());
        assert!(validate_positive_number("cache.ttl_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("objects.database", "SNOWFLAKE_EXAMPLE").is_ok());
        assert!(validate_identifier("objects.database", "_tmp$1").is_ok());
        assert!(validate_identifier("objects.database", "1BAD").is_err());
        assert!(validate_identifier("objects.database", "X; DROP TABLE Y").is_err());
        assert!(validate_identifier("objects.database", "").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("token".to_string());
        let absent: Option<String> = None;
        assert_eq!(
            validate_required_field("warehouse.token", &present).unwrap(),
            "token"
        );
        assert!(matches!(
            validate_required_field("warehouse.token", &absent),
            Err(DashboardError::MissingConfigError { .. })
        ));
    }
}
