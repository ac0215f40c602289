use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use std::fs;
use tower::ServiceExt;
use tracing::info;
use wondash::api::{AppState, build_router};
use wondash::core::config::AppConfig;

mod test_utils {
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn chart_meta_body(price: f64, currency: &str, name: &str, prev_close: f64) -> String {
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{
                            "regularMarketPrice": {price},
                            "currency": "{currency}",
                            "shortName": "{name}",
                            "chartPreviousClose": {prev_close}
                        }}
                    }}]
                }}
            }}"#
        )
    }

    pub async fn mount_chart(server: &MockServer, symbol: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Index symbols start with `^`, which the client percent-encodes, so
    /// these mounts match on a regex instead of a literal path.
    pub async fn mount_index(server: &MockServer, tail: &str, status: u16, body: &str, hits: u64) {
        Mock::given(method("GET"))
            .and(path_regex(format!("^/v8/finance/chart/.*{tail}$")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(hits)
            .mount(server)
            .await;
    }

    pub async fn mount_healthy_indices(server: &MockServer, hits: u64) {
        mount_index(
            server,
            "KS11",
            200,
            &chart_meta_body(2520.5, "KRW", "KOSPI", 2500.0),
            hits,
        )
        .await;
        mount_index(
            server,
            "GSPC",
            200,
            &chart_meta_body(5830.2, "USD", "S&P 500", 5800.0),
            hits,
        )
        .await;
        mount_chart(
            server,
            "KRW=X",
            200,
            &chart_meta_body(1383.25, "KRW", "USD/KRW", 1380.0),
        )
        .await;
    }

    pub async fn mount_er_api(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }
}

fn config_for(yahoo: &str, er_api: &str, frankfurter: &str) -> tempfile::NamedTempFile {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
server:
  host: "127.0.0.1"
  port: 0
providers:
  yahoo_base_url: {yahoo}
  er_api_base_url: {er_api}
  frankfurter_base_url: {frankfurter}
"#
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");
    config_file
}

fn state_for(server_uri: &str) -> AppState {
    let config_file = config_for(server_uri, server_uri, server_uri);
    let config = AppConfig::load(Some(config_file.path())).expect("Failed to load config");
    AppState::from_config(&config).expect("Failed to build state")
}

async fn get_json(
    router: &axum::Router,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[test_log::test(tokio::test)]
async fn test_korean_suffix_fallback_end_to_end() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_chart(&server, "293490.KS", 404, r#"{"chart":{"result":null}}"#).await;
    test_utils::mount_chart(
        &server,
        "293490.KQ",
        200,
        &test_utils::chart_meta_body(55300.0, "KRW", "Kakao Games", 54000.0),
    )
    .await;

    let state = state_for(&server.uri());
    let router = build_router(state);

    let (status, json) = get_json(&router, "/stock/korean?symbol=293490").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["symbol"], "293490");
    assert_eq!(json["data"]["displayName"], "Kakao Games");
    assert_eq!(json["data"]["currency"], "KRW");
    assert_eq!(json["data"]["exchange"], "KRX");
    assert_eq!(json["data"]["currentPrice"], 55300.0);
}

#[test_log::test(tokio::test)]
async fn test_korean_lookup_exhausted_returns_404() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_chart(&server, "999999.KS", 404, "").await;
    test_utils::mount_chart(&server, "999999.KQ", 404, "").await;

    let state = state_for(&server.uri());
    let router = build_router(state);

    let (status, json) = get_json(&router, "/stock/korean?symbol=999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("999999"));
}

#[test_log::test(tokio::test)]
async fn test_search_dispatch_end_to_end() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_chart(
        &server,
        "AAPL",
        200,
        &test_utils::chart_meta_body(189.3, "USD", "Apple Inc.", 185.0),
    )
    .await;
    test_utils::mount_chart(
        &server,
        "005930.KS",
        200,
        &test_utils::chart_meta_body(71000.0, "KRW", "Samsung Electronics", 70500.0),
    )
    .await;

    let state = state_for(&server.uri());
    let router = build_router(state);

    // Lowercase global input is normalized before it reaches upstream.
    let (status, json) = get_json(&router, "/stock/search?query=aapl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["symbol"], "AAPL");
    assert_eq!(json["data"]["displayName"], "Apple Inc.");

    // Six digits dispatches to the Korean path, here via the path form.
    let (status, json) = get_json(&router, "/stock/search/005930").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["currency"], "KRW");
    assert_eq!(json["data"]["exchange"], "KRX");
}

#[test_log::test(tokio::test)]
async fn test_market_data_is_served_from_cache_within_ttl() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_healthy_indices(&server, 1).await;

    let state = state_for(&server.uri());
    let router = build_router(state);

    let (status, first) = get_json(&router, "/market/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["kospi"]["value"], 2520.5);
    assert_eq!(first["kospi"]["isRealTime"], true);
    assert_eq!(first["sp500"]["value"], 5830.2);
    assert_eq!(first["usdKrw"]["value"], 1383.25);

    // Second read inside the TTL must not hit the index mocks again;
    // the expect(1) above is verified when the mock server drops.
    let (status, second) = get_json(&router, "/market/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["kospi"], first["kospi"]);

    info!("market overview served twice from one upstream round");
}

#[test_log::test(tokio::test)]
async fn test_rate_chain_falls_back_to_er_api() {
    let yahoo = wiremock::MockServer::start().await;
    test_utils::mount_chart(&yahoo, "KRW=X", 500, "").await;

    let fallback = wiremock::MockServer::start().await;
    test_utils::mount_er_api(
        &fallback,
        200,
        r#"{"result": "success", "rates": {"KRW": 1412.5}}"#,
    )
    .await;

    // Frankfurter must never be consulted once er-api answers.
    let last_resort = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&last_resort)
        .await;

    let config_file = config_for(&yahoo.uri(), &fallback.uri(), &last_resort.uri());
    let config = AppConfig::load(Some(config_file.path())).expect("Failed to load config");
    let state = AppState::from_config(&config).expect("Failed to build state");

    assert_eq!(state.rates.get_rate().await, 1412.5);
    // Within the TTL the chain is not traversed again.
    assert_eq!(state.rates.get_rate().await, 1412.5);
}

#[test_log::test(tokio::test)]
async fn test_market_data_degrades_without_failing() {
    let yahoo = wiremock::MockServer::start().await;
    // Every index fetch fails, the rate chain still works through er-api.
    test_utils::mount_index(&yahoo, "KS11", 500, "", 1).await;
    test_utils::mount_index(&yahoo, "GSPC", 500, "", 1).await;
    test_utils::mount_chart(&yahoo, "KRW=X", 500, "").await;

    let fallback = wiremock::MockServer::start().await;
    test_utils::mount_er_api(
        &fallback,
        200,
        r#"{"result": "success", "rates": {"KRW": 1412.5}}"#,
    )
    .await;

    let config_file = config_for(&yahoo.uri(), &fallback.uri(), &fallback.uri());
    let config = AppConfig::load(Some(config_file.path())).expect("Failed to load config");
    let state = AppState::from_config(&config).expect("Failed to build state");

    state.rates.get_rate().await;
    let router = build_router(state);

    let (status, json) = get_json(&router, "/market/data").await;
    assert_eq!(status, StatusCode::OK, "overview must not fail with upstreams down");
    assert_eq!(json["kospi"]["isRealTime"], false);
    assert_eq!(json["sp500"]["isRealTime"], false);
    // The USD/KRW card borrows the rate cache's value instead of a fabricated one.
    assert_eq!(json["usdKrw"]["value"], 1412.5);
    assert_eq!(json["usdKrw"]["isRealTime"], false);
}

#[test_log::test(tokio::test)]
async fn test_chart_endpoint_is_deterministic_within_a_day() {
    let server = wiremock::MockServer::start().await;
    let state = state_for(&server.uri());
    let router = build_router(state);

    let (status, first) = get_json(&router, "/analytics/chart?symbol=005930&range=1M").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["dataPoints"], 30);

    let (_, second) = get_json(&router, "/analytics/chart?symbol=005930&range=1M").await;
    assert_eq!(first["data"]["data"], second["data"]["data"]);

    let (status, json) = get_json(&router, "/analytics/chart?symbol=005930&range=5Y").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_chart(
        &server,
        "KRW=X",
        200,
        &test_utils::chart_meta_body(1383.25, "KRW", "USD/KRW", 1380.0),
    )
    .await;

    let config_file = config_for(&server.uri(), &server.uri(), &server.uri());

    let result = wondash::run_command(
        wondash::AppCommand::Rate,
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Rate command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_server_binds_and_answers_over_http() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount_healthy_indices(&server, 1).await;

    let state = state_for(&server.uri());
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    let serve_task = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let response = reqwest::get(format!("http://{addr}/market/data"))
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap()),
        Some("*")
    );

    let json: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(json["kospi"]["value"], 2520.5);

    serve_task.abort();
}
