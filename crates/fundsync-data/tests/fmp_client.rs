//! FMP 클라이언트 HTTP 통합 테스트 (mockito).

use fundsync_core::{PeriodType, ReportVariant, StatementKind, StatementSpec, Symbol};
use fundsync_data::{DataError, FinancialDataSource, FmpClient, RetryPolicy};
use mockito::Matcher;
use secrecy::SecretString;
use std::time::Duration;

fn client(base_url: &str, max_attempts: u32) -> FmpClient {
    FmpClient::new(SecretString::from("test-key".to_string()))
        .unwrap()
        .with_base_url(base_url)
        .with_retry(RetryPolicy {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        })
}

#[tokio::test]
async fn test_quote_passes_api_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v3/quote/AAPL")
        .match_query(Matcher::UrlEncoded("apikey".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"symbol":"AAPL","price":190.5,"marketCap":2900000000000}]"#)
        .create_async()
        .await;

    let records = client(&server.url(), 3)
        .quote(&Symbol::new("AAPL"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["symbol"], "AAPL");
}

#[tokio::test]
async fn test_statement_uses_period_and_variant() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v3/balance-sheet-statement-as-reported/MSFT")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("period".into(), "quarter".into()),
            Matcher::UrlEncoded("apikey".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"date":"2024-03-31","period":"Q3"},{"date":"2023-12-31","period":"Q2"}]"#)
        .create_async()
        .await;

    let spec = StatementSpec::new(
        StatementKind::BalanceSheet,
        PeriodType::Quarter,
        ReportVariant::AsReported,
    );
    let records = client(&server.url(), 3)
        .statement(&Symbol::new("MSFT"), spec)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_empty_array_is_not_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v3/profile/ZZZ")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let records = client(&server.url(), 3)
        .profile(&Symbol::new("ZZZ"))
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_server_errors_are_retried_until_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v3/quote/AAPL")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("unavailable")
        .expect(3)
        .create_async()
        .await;

    let err = client(&server.url(), 3)
        .quote(&Symbol::new("AAPL"))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, DataError::RetriesExhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v3/quote/AAPL")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"Error Message":"Invalid API KEY."}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client(&server.url(), 5)
        .quote(&Symbol::new("AAPL"))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, DataError::Http { status: 401, .. }));
}
