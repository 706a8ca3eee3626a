//! Warehouse access over the SQL REST API (`/api/v2/statements`).
//!
//! A statement is submitted with a bearer token the hosting environment
//! already issued. Short queries answer 200 with the first partition
//! inline; longer ones answer 202 and are polled by statement handle.
//! Remaining partitions are fetched one by one and appended in order.

use crate::config::DashboardConfig;
use crate::domain::model::{Cell, Table};
use crate::domain::ports::{Statement, Warehouse};
use crate::utils::error::{DashboardError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
const USER_AGENT: &str = concat!("dq-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, Binding<'a>>,
}

#[derive(Debug, Serialize)]
struct Binding<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    code: Option<String>,
    message: Option<String>,
    sql_state: Option<String>,
    statement_handle: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    num_rows: u64,
    #[serde(default)]
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Vec<IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    scale: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PartitionResponse {
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

enum Submission {
    Complete(StatementResponse),
    Pending(String),
}

pub struct SqlApiWarehouse {
    client: Client,
    statements_url: String,
    token: String,
    token_type: String,
    database: String,
    warehouse: Option<String>,
    role: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl SqlApiWarehouse {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let token = config
            .token()
            .ok_or_else(|| DashboardError::MissingConfigError {
                field: "warehouse.token".to_string(),
            })?
            .to_string();

        // Server-side timeout plus headroom for the HTTP round trip.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout() + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            statements_url: format!(
                "{}/api/v2/statements",
                config.warehouse.account_url.trim_end_matches('/')
            ),
            token,
            token_type: config.warehouse.token_type.clone(),
            database: config.objects.database.clone(),
            warehouse: config.warehouse.warehouse.clone(),
            role: config.warehouse.role.clone(),
            timeout: config.request_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(TOKEN_TYPE_HEADER, &self.token_type)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn submit(&self, statement: &Statement) -> Result<Submission> {
        let bindings = statement
            .bindings
            .iter()
            .enumerate()
            .map(|(i, value)| {
                (
                    (i + 1).to_string(),
                    Binding {
                        kind: "TEXT",
                        value: value.as_str(),
                    },
                )
            })
            .collect();

        let body = SubmitRequest {
            statement: &statement.sql,
            timeout: self.timeout.as_secs(),
            database: Some(&self.database),
            warehouse: self.warehouse.as_deref(),
            role: self.role.as_deref(),
            bindings,
        };

        tracing::debug!("Submitting statement: {}", statement.sql);
        let response = self
            .authorized(self.client.post(&self.statements_url))
            .json(&body)
            .send()
            .await?;
        tracing::debug!("SQL API response status: {}", response.status());

        read_submission(response).await
    }

    async fn wait_for(&self, handle: &str) -> Result<StatementResponse> {
        let deadline = Instant::now() + self.timeout;
        let status_url = format!("{}/{}", self.statements_url, handle);

        loop {
            if Instant::now() >= deadline {
                return Err(DashboardError::TimeoutError {
                    handle: handle.to_string(),
                    seconds: self.timeout.as_secs(),
                });
            }
            sleep(self.poll_interval).await;

            let response = self
                .authorized(self.client.get(&status_url))
                .send()
                .await?;
            match read_submission(response).await? {
                Submission::Complete(body) => return Ok(body),
                Submission::Pending(_) => {
                    tracing::debug!("Statement {} still running", handle);
                }
            }
        }
    }

    async fn fetch_partition(
        &self,
        handle: &str,
        partition: usize,
    ) -> Result<Vec<Vec<Option<String>>>> {
        let url = format!("{}/{}?partition={}", self.statements_url, handle, partition);
        tracing::debug!("Fetching partition {} of {}", partition, handle);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let body: PartitionResponse = serde_json::from_str(&response.text().await?)?;
        Ok(body.data)
    }

    async fn collect_table(&self, body: StatementResponse) -> Result<Table> {
        let meta = body
            .result_set_meta_data
            .ok_or_else(|| DashboardError::schema("response has no resultSetMetaData"))?;

        let mut raw_rows = body.data;
        if meta.partition_info.len() > 1 {
            let handle = body.statement_handle.as_deref().ok_or_else(|| {
                DashboardError::schema("multi-partition result without statementHandle")
            })?;
            for partition in 1..meta.partition_info.len() {
                raw_rows.extend(self.fetch_partition(handle, partition).await?);
            }
        }

        if meta.num_rows > 0 && raw_rows.len() as u64 != meta.num_rows {
            tracing::warn!(
                "Expected {} rows but received {}",
                meta.num_rows,
                raw_rows.len()
            );
        }

        decode_rows(&meta.row_type, raw_rows)
    }
}

#[async_trait]
impl Warehouse for SqlApiWarehouse {
    async fn query(&self, statement: &Statement) -> Result<Table> {
        let body = match self.submit(statement).await? {
            Submission::Complete(body) => body,
            Submission::Pending(handle) => {
                tracing::info!("Statement {} running asynchronously, polling", handle);
                self.wait_for(&handle).await?
            }
        };
        let table = self.collect_table(body).await?;
        tracing::debug!("Statement returned {} rows", table.len());
        Ok(table)
    }
}

async fn read_submission(response: Response) -> Result<Submission> {
    match response.status() {
        StatusCode::OK => {
            let body: StatementResponse = serde_json::from_str(&response.text().await?)?;
            Ok(Submission::Complete(body))
        }
        StatusCode::ACCEPTED => {
            let body: StatementResponse = serde_json::from_str(&response.text().await?)?;
            let handle = body
                .statement_handle
                .ok_or_else(|| DashboardError::schema("202 response without statementHandle"))?;
            Ok(Submission::Pending(handle))
        }
        _ => Err(error_from_response(response).await),
    }
}

async fn error_from_response(response: Response) -> DashboardError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return DashboardError::HttpError(e),
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return DashboardError::HttpStatusError {
            status: status.as_u16(),
            body: text,
        };
    }

    match serde_json::from_str::<StatementResponse>(&text) {
        Ok(StatementResponse {
            code: Some(code),
            message: Some(message),
            sql_state,
            ..
        }) => DashboardError::QueryError {
            code,
            sql_state: sql_state.unwrap_or_default(),
            message,
        },
        _ => DashboardError::HttpStatusError {
            status: status.as_u16(),
            body: text,
        },
    }
}

fn decode_rows(row_type: &[RowType], raw_rows: Vec<Vec<Option<String>>>) -> Result<Table> {
    let columns: Vec<String> = row_type.iter().map(|c| c.name.clone()).collect();
    let mut table = Table::new(columns);

    for (index, raw) in raw_rows.into_iter().enumerate() {
        if raw.len() != row_type.len() {
            return Err(DashboardError::schema(format!(
                "row {} has {} values for {} columns",
                index,
                raw.len(),
                row_type.len()
            )));
        }
        let row = raw
            .into_iter()
            .zip(row_type)
            .map(|(value, column)| decode_cell(value, column))
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

/// Unparseable values fall back to text rather than failing the whole load.
fn decode_cell(value: Option<String>, column: &RowType) -> Cell {
    let Some(raw) = value else {
        return Cell::Null;
    };

    let decoded = match column.kind.to_ascii_lowercase().as_str() {
        "fixed" if column.scale.unwrap_or(0) == 0 => raw
            .parse::<i64>()
            .map(Cell::Int)
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(Cell::Float)),
        "fixed" | "real" => raw.parse::<f64>().ok().map(Cell::Float),
        "boolean" => match raw.as_str() {
            "true" | "1" => Some(Cell::Bool(true)),
            "false" | "0" => Some(Cell::Bool(false)),
            _ => None,
        },
        "date" => raw.parse::<i64>().ok().and_then(epoch_days).map(Cell::Date),
        "timestamp_ntz" | "timestamp_ltz" | "timestamp_tz" => {
            parse_epoch_timestamp(&raw).map(Cell::Timestamp)
        }
        _ => None,
    };

    decoded.unwrap_or(Cell::Text(raw))
}

fn epoch_days(days: i64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    if days >= 0 {
        epoch.checked_add_days(Days::new(days as u64))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// `seconds[.fraction][ offset]`; the offset of TIMESTAMP_TZ values is ignored
/// and the instant is shown in UTC.
fn parse_epoch_timestamp(raw: &str) -> Option<chrono::NaiveDateTime> {
    let instant = raw.split_whitespace().next()?;
    let negative = instant.starts_with('-');
    let (whole, fraction) = instant.split_once('.').unwrap_or((instant, ""));

    let mut secs: i64 = whole.parse().ok()?;
    let mut nanos: u32 = if fraction.is_empty() {
        0
    } else {
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        digits.parse().ok()?
    };

    if negative && nanos > 0 {
        secs -= 1;
        nanos = 1_000_000_000 - nanos;
    }

    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}
