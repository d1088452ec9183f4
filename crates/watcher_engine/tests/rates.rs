use std::time::Duration;

use serde_json::json;
use watcher_engine::{FailureKind, RateFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn fetcher_with(body: ResponseTemplate) -> (MockServer, RateFetcher) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/last/USD-BRL"))
        .respond_with(body)
        .mount(&server)
        .await;
    let url = format!("{}/json/last/USD-BRL", server.uri());
    let fetcher = RateFetcher::new(&url, Duration::from_secs(2)).unwrap();
    (server, fetcher)
}

#[tokio::test]
async fn bid_is_read_from_a_string_field() {
    let (_server, fetcher) =
        fetcher_with(ResponseTemplate::new(200).set_body_json(json!({"USDBRL": {"bid": "5.4321"}})))
            .await;
    assert_eq!(fetcher.fetch_usd_brl().await.unwrap(), 5.4321);
}

#[tokio::test]
async fn numeric_bid_is_accepted() {
    let (_server, fetcher) =
        fetcher_with(ResponseTemplate::new(200).set_body_json(json!({"USDBRL": {"bid": 5.1}}))).await;
    assert_eq!(fetcher.fetch_usd_brl().await.unwrap(), 5.1);
}

#[tokio::test]
async fn unusable_bid_is_an_error() {
    let (_server, fetcher) =
        fetcher_with(ResponseTemplate::new(200).set_body_json(json!({"USDBRL": {"bid": "n/a"}})))
            .await;
    assert_eq!(fetcher.fetch_usd_brl().await.unwrap_err().kind, FailureKind::Decode);
}

#[tokio::test]
async fn server_error_keeps_the_status() {
    let (_server, fetcher) = fetcher_with(ResponseTemplate::new(503)).await;
    assert_eq!(
        fetcher.fetch_usd_brl().await.unwrap_err().kind,
        FailureKind::HttpStatus(503)
    );
}
