//! HTTP behaviour of the FMP client and fetcher against a mock server.

use approx::assert_relative_eq;
use ronda_fmp::{ClientConfig, DataFetcher, FetchConfig, FmpClient, FmpError, Period, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> FmpClient {
    let config = ClientConfig {
        base_url: server.uri(),
        request_delay_ms: 0,
        ..ClientConfig::default()
    };
    FmpClient::with_config("test-key", &config)
        .unwrap()
        .with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        })
}

#[tokio::test]
async fn second_identical_call_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ratios"))
        .and(query_param("symbol", "AAPL"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2023-09-30", "fiscalYear": "2023", "returnOnEquity": 1.56}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = client.ratios("aapl", Period::Annual, Some(5)).await.unwrap();
    let second = client.ratios("AAPL", Period::Annual, Some(5)).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second[0].return_on_equity, Some(1.56));
    assert_eq!(client.rate_limiter().in_flight_window(), 1);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"symbol": "MSFT", "companyName": "Microsoft", "price": 400.0, "marketCap": 3.0e12}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let profiles = client(&server).profiles(&["MSFT"]).await.unwrap();
    assert_eq!(profiles[0].symbol, "MSFT");
}

#[tokio::test]
async fn rate_limited_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/earnings"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/earnings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let reports = client(&server).earnings("AAPL", 4).await.unwrap();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn retries_stop_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/key-metrics"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server)
        .key_metrics("AAPL", Period::Annual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FmpError::Transient(_)));
}

#[tokio::test]
async fn permanent_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/income-statement"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/balance-sheet-statement"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .income_statement("AAPL", Period::Annual, Some(5))
        .await
        .unwrap_err();
    assert!(matches!(err, FmpError::Unauthorized(_)));
    assert!(err.is_fatal_for_run());

    let err = client
        .balance_sheet("AAPL", Period::Annual, Some(5))
        .await
        .unwrap_err();
    assert!(matches!(err, FmpError::NotFound(_)));
}

#[tokio::test]
async fn error_message_bodies_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ratios-ttm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Error Message": "Invalid API KEY. Please retry or visit our documentation."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cash-flow-statement"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Error Message": "Limit Reach for this endpoint."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stock-list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(matches!(
        client.ratios_ttm("AAPL").await.unwrap_err(),
        FmpError::Unauthorized(_)
    ));
    assert!(matches!(
        client.cash_flow("AAPL", Period::Annual, None).await.unwrap_err(),
        FmpError::Api(_)
    ));
    assert!(matches!(
        client.stock_list().await.unwrap_err(),
        FmpError::Malformed(_)
    ));
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_record_degrades_optional_sources() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/profile",
        json!([{"symbol": "ACME", "companyName": "Acme", "sector": "Technology",
                "price": 20.0, "marketCap": 2.0e9}]),
    )
    .await;
    mount_json(
        &server,
        "/income-statement",
        json!([
            {"date": "2023-12-31", "revenue": 121.0, "netIncome": 12.0, "eps": 1.21},
            {"date": "2022-12-31", "revenue": 110.0, "netIncome": 11.0, "eps": 1.10},
            {"date": "2021-12-31", "revenue": 100.0, "netIncome": 10.0, "eps": 1.00}
        ]),
    )
    .await;
    mount_json(
        &server,
        "/balance-sheet-statement",
        json!([{"date": "2023-12-31", "totalDebt": 0.0, "totalStockholdersEquity": 60.0}]),
    )
    .await;
    mount_json(
        &server,
        "/cash-flow-statement",
        json!([{"date": "2023-12-31", "operatingCashFlow": 15.0, "freeCashFlow": 11.0}]),
    )
    .await;
    mount_json(
        &server,
        "/ratios",
        json!([{"date": "2023-12-31", "returnOnEquity": 0.2, "priceToBookRatio": 3.0}]),
    )
    .await;
    mount_json(&server, "/key-metrics", json!([])).await;
    mount_json(&server, "/ratios-ttm", json!([{"peRatioTTM": 16.5}])).await;
    // insider, earnings and sentiment routes are unmounted and answer 404.

    let fetcher = DataFetcher::new(client(&server), FetchConfig::default());
    let record = fetcher.fetch_record_by_symbol("acme").await.unwrap();
    assert_eq!(record.symbol(), "ACME");
    assert_eq!(record.fiscal_years, vec![2021, 2022, 2023]);
    assert_eq!(record.pe_ratio, Some(16.5));
    assert_eq!(record.pb_ratio, Some(3.0));
    assert_relative_eq!(record.roe.latest().unwrap(), 0.2);
    assert_eq!(record.debt_to_equity(), Some(0.0));
    assert!(record.insider.is_none());
    assert!(record.earnings.is_none());
    assert!(record.social.is_none());

    // The ROE pass reuses the cached ratios response.
    let roe = fetcher.fetch_roe_history("ACME").await.unwrap();
    assert_eq!(roe.present(), vec![0.2]);
}

#[tokio::test]
async fn fetch_record_fails_without_statements() {
    let server = MockServer::start().await;
    mount_json(&server, "/income-statement", json!([])).await;
    mount_json(&server, "/balance-sheet-statement", json!([])).await;
    mount_json(&server, "/cash-flow-statement", json!([])).await;

    let fetcher = DataFetcher::new(client(&server), FetchConfig::default());
    let profile = ronda_traits::CompanyProfile {
        symbol: "EMPTY".to_string(),
        name: "Empty".to_string(),
        sector: "Technology".to_string(),
        industry: String::new(),
        price: Some(1.0),
        market_cap: Some(1.0e9),
        is_etf: false,
        is_actively_trading: true,
    };
    let err = fetcher.fetch_record(&profile).await.unwrap_err();
    assert!(matches!(err, FmpError::NoData(_)));
}

#[tokio::test]
async fn universe_is_batched_filtered_and_sorted() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/stock-list",
        json!([
            {"symbol": "CCC", "exchangeShortName": "NASDAQ", "type": "stock"},
            {"symbol": "AAA", "exchangeShortName": "NASDAQ", "type": "stock"},
            {"symbol": "BBB", "exchangeShortName": "NASDAQ", "type": "stock"},
            {"symbol": "QQQ", "exchangeShortName": "NASDAQ", "type": "etf"},
            {"symbol": "IBM", "exchangeShortName": "NYSE", "type": "stock"}
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(query_param("symbol", "CCC,AAA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"symbol": "CCC", "price": 3.0, "marketCap": 3.0e9},
            {"symbol": "AAA", "price": 1.0, "marketCap": 1.0e9}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(query_param("symbol", "BBB"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = FetchConfig {
        profile_batch_size: 2,
        ..FetchConfig::default()
    };
    let fetcher = DataFetcher::new(client(&server), config);
    let universe = fetcher.fetch_universe().await.unwrap();
    let symbols: Vec<&str> = universe.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAA", "CCC"]);
}
