use anyhow::Result;
use dq_dashboard::core::catalog::{Action, QueryCatalog};
use dq_dashboard::domain::model::Cell;
use dq_dashboard::domain::ports::{Statement, Warehouse};
use dq_dashboard::{DashboardConfig, DashboardError, SqlApiWarehouse};
use httpmock::prelude::*;
use serde_json::json;

fn config_for(server: &MockServer) -> DashboardConfig {
    let content = format!(
        r#"
[warehouse]
account_url = "{}"
token = "test-token"
warehouse = "COMPUTE_WH"
role = "ANALYST"
timeout_seconds = 5
poll_interval_ms = 10
"#,
        server.base_url()
    );
    DashboardConfig::from_toml_str(&content).expect("valid test config")
}

fn summary_body(handle: &str) -> serde_json::Value {
    json!({
        "code": "090001",
        "statementHandle": handle,
        "message": "Statement executed successfully.",
        "resultSetMetaData": {
            "numRows": 1,
            "rowType": [
                { "name": "TOTAL_RECORDS", "type": "fixed", "scale": 0 },
                { "name": "QUALITY_SCORE", "type": "fixed", "scale": 2 },
                { "name": "LAST_REFRESH", "type": "timestamp_ntz" }
            ],
            "partitionInfo": [{ "rowCount": 1 }]
        },
        "data": [["1000", "95.00", "1700000000.000000000"]]
    })
}

/// 同步回應：200 直接帶回第一個分區
#[tokio::test]
async fn test_inline_result_is_decoded() -> Result<()> {
    let server = MockServer::start_async().await;

    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v2/statements")
                .header("authorization", "Bearer test-token")
                .header("x-snowflake-authorization-token-type", "OAUTH")
                .json_body_partial(
                    r#"{"database": "SNOWFLAKE_EXAMPLE", "warehouse": "COMPUTE_WH", "role": "ANALYST"}"#,
                );
            then.status(200).json_body(summary_body("h-inline"));
        })
        .await;

    let warehouse = SqlApiWarehouse::new(&config_for(&server))?;
    let table = warehouse
        .query(&Statement::new("SELECT * FROM SFE_DT_QUALITY_SUMMARY"))
        .await?;

    submit.assert_async().await;
    assert_eq!(table.columns, vec!["TOTAL_RECORDS", "QUALITY_SCORE", "LAST_REFRESH"]);
    assert_eq!(table.rows[0][0], Cell::Int(1000));
    assert_eq!(table.rows[0][1], Cell::Float(95.0));
    assert_eq!(table.rows[0][2].to_string(), "2023-11-14 22:13:20");
    Ok(())
}

/// 非同步執行：202 後以 statement handle 輪詢
#[tokio::test]
async fn test_accepted_statement_is_polled() -> Result<()> {
    let server = MockServer::start_async().await;

    let submit = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v2/statements");
            then.status(202).json_body(json!({
                "code": "333334",
                "message": "Asynchronous execution in progress.",
                "statementHandle": "h-async",
                "statementStatusUrl": "/api/v2/statements/h-async"
            }));
        })
        .await;
    let status = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/statements/h-async")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(summary_body("h-async"));
        })
        .await;

    let warehouse = SqlApiWarehouse::new(&config_for(&server))?;
    let table = warehouse
        .query(&Statement::new("SELECT * FROM SFE_DT_QUALITY_SUMMARY"))
        .await?;

    submit.assert_async().await;
    status.assert_async().await;
    assert_eq!(table.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_additional_partitions_are_appended() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v2/statements");
            then.status(200).json_body(json!({
                "statementHandle": "h-multi",
                "resultSetMetaData": {
                    "numRows": 3,
                    "rowType": [
                        { "name": "MARKET_AREA", "type": "text" }
                    ],
                    "partitionInfo": [{ "rowCount": 1 }, { "rowCount": 1 }, { "rowCount": 1 }]
                },
                "data": [["Austin"]]
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/statements/h-multi")
                .query_param("partition", "1");
            then.status(200).json_body(json!({ "data": [["Denver"]] }));
        })
        .await;
    let third = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/statements/h-multi")
                .query_param("partition", "2");
            then.status(200).json_body(json!({ "data": [[null]] }));
        })
        .await;

    let warehouse = SqlApiWarehouse::new(&config_for(&server))?;
    let table = warehouse
        .query(&Statement::new("SELECT DISTINCT market_area FROM listings"))
        .await?;

    second.assert_async().await;
    third.assert_async().await;
    assert_eq!(
        table.rows,
        vec![
            vec![Cell::Text("Austin".into())],
            vec![Cell::Text("Denver".into())],
            vec![Cell::Null],
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_market_bindings_are_sent_as_text() -> Result<()> {
    let server = MockServer::start_async().await;
    let config = config_for(&server);
    let catalog = QueryCatalog::new(config.objects.clone());
    let statement = catalog.action(
        Action::NullPrices,
        &["Austin".to_string(), "Denver".to_string()],
    );

    let submit = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v2/statements").json_body_partial(
                r#"{"bindings": {"1": {"type": "TEXT", "value": "Austin"}, "2": {"type": "TEXT", "value": "Denver"}}}"#,
            );
            then.status(200).json_body(json!({
                "resultSetMetaData": {
                    "numRows": 0,
                    "rowType": [{ "name": "LISTING_ID", "type": "fixed", "scale": 0 }],
                    "partitionInfo": []
                },
                "data": []
            }));
        })
        .await;

    let warehouse = SqlApiWarehouse::new(&config)?;
    let table = warehouse.query(&statement).await?;

    submit.assert_async().await;
    assert!(table.is_empty());
    assert_eq!(table.columns, vec!["LISTING_ID"]);
    Ok(())
}

#[tokio::test]
async fn test_missing_object_maps_to_query_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v2/statements");
            then.status(422).json_body(json!({
                "code": "002003",
                "sqlState": "42S02",
                "message": "SQL compilation error: Object 'SFE_DT_QUALITY_SUMMARY' does not exist or not authorized.",
                "statementHandle": "h-failed"
            }));
        })
        .await;

    let warehouse = SqlApiWarehouse::new(&config_for(&server))?;
    let err = warehouse
        .query(&Statement::new("SELECT * FROM SFE_DT_QUALITY_SUMMARY"))
        .await
        .unwrap_err();

    match &err {
        DashboardError::QueryError {
            code,
            sql_state,
            message,
        } => {
            assert_eq!(code, "002003");
            assert_eq!(sql_state, "42S02");
            assert!(message.contains("does not exist"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.recovery_suggestion().contains("refresh"));
    Ok(())
}

#[tokio::test]
async fn test_rejected_token_maps_to_status_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v2/statements");
            then.status(401).body("token expired");
        })
        .await;

    let warehouse = SqlApiWarehouse::new(&config_for(&server))?;
    let err = warehouse
        .query(&Statement::new("SELECT 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::HttpStatusError { status: 401, .. }));
    assert!(err.recovery_suggestion().contains("token"));
    Ok(())
}

#[tokio::test]
async fn test_statement_still_running_times_out() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v2/statements");
            then.status(202).json_body(json!({ "statementHandle": "h-slow" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/statements/h-slow");
            then.status(202).json_body(json!({ "statementHandle": "h-slow" }));
        })
        .await;

    let mut config = config_for(&server);
    config.warehouse.timeout_seconds = 1;
    config.warehouse.poll_interval_ms = 100;

    let warehouse = SqlApiWarehouse::new(&config)?;
    let err = warehouse
        .query(&Statement::new("SELECT 1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DashboardError::TimeoutError { ref handle, seconds: 1 } if handle == "h-slow"
    ));
    Ok(())
}
