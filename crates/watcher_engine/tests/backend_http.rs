use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use watcher_core::{DiagnosticsPatterns, SearchRequest};
use watcher_engine::{
    Abortable, AbortSignal, Backend, BackendSettings, FailureKind, ReqwestBackend,
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> ReqwestBackend {
    // No trailing slash on purpose; paths must still resolve under the base.
    ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .expect("backend builds")
}

fn search_request(prompt: &str) -> SearchRequest {
    SearchRequest {
        prompt: prompt.to_string(),
        model: "sonar".to_string(),
        mode_label: "List".to_string(),
        temperature: 0.2,
        max_output_tokens: 900,
        input_per_million: 1.0,
        output_per_million: 1.0,
        usd_brl: 5.2,
        save: false,
        link_tokens: 0,
        link: None,
    }
}

#[tokio::test]
async fn collect_posts_one_group_and_reads_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collect"))
        .and(body_json(json!({"groups": ["gov"], "min_days": 21})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"fixed_links": 2, "new_items": "5"},
            "errors": [{"ts": "t", "where": "collect", "msg": "one source slow", "stack": ""}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let counts = backend_for(&server).collect("gov", 21).await.unwrap();
    assert_eq!(counts.fixed_links, 2);
    assert_eq!(counts.new_items, 5);
}

#[tokio::test]
async fn http_error_status_maps_to_failure_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collect"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = backend_for(&server).collect("gov", 21).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server).fetch_config().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn items_are_loaded_with_group_and_status_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("group", "funda"))
        .and(query_param("status", "novo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": {"sources": [{"source": "CNPq", "items": [
                {"uid": "x", "title": "Call", "deadline_iso": "2025-06-01", "amount_brl": 1200}
            ]}]}
        })))
        .mount(&server)
        .await;

    let records = backend_for(&server)
        .load_items("funda", Some("novo"))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].group, "funda");
    assert_eq!(records[0].source, "CNPq");
    assert_eq!(records[0].amount, Some(1200.0));
}

#[tokio::test]
async fn catch_all_status_sends_no_status_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("group", "gov"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": {"sources": []}})))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    for status in ["All", "todos", "  "] {
        backend.load_items("gov", Some(status)).await.unwrap();
    }

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert_eq!(request.url.query(), Some("group=gov"));
    }
}

#[tokio::test]
async fn diagnostics_report_keeps_rows_and_logs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/diag/providers"))
        .and(body_json(json!({"re_gov": "finep", "re_funda": "", "re_corp": "", "re_latam": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "diag": {
                "rows": [{"Grupo": "gov", "Fonte": "FINEP", "Itens": 3, "Tempo (s)": 0.8, "Erro": "", "Hint": "check"}],
                "logs": [["ts", "msg"], ["1", "ok"]]
            }
        })))
        .mount(&server)
        .await;

    let patterns = DiagnosticsPatterns {
        gov: "finep".to_string(),
        ..DiagnosticsPatterns::default()
    };
    let outcome = backend_for(&server)
        .run_diagnostics(&patterns, &AbortSignal::new())
        .await;
    let report = match outcome {
        Abortable::Completed(Ok(report)) => report,
        other => panic!("expected a report, got {other:?}"),
    };
    assert_eq!(report.rows[0].item_count, 3);
    assert_eq!(report.rows[0].error, None);
    assert_eq!(report.rows[0].hint.as_deref(), Some("check"));
    assert_eq!(report.log_lines(), vec!["1 | ok"]);
}

#[tokio::test]
async fn aborting_diagnostics_drops_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/diag/providers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"diag": {"rows": [], "logs": []}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let signal = AbortSignal::new();
    let trigger = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.abort();
    });

    let started = std::time::Instant::now();
    let outcome = backend
        .run_diagnostics(&DiagnosticsPatterns::default(), &signal)
        .await;
    assert_eq!(outcome, Abortable::Aborted);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn token_count_validates_link_before_calling() {
    let server = MockServer::start().await;
    let backend = backend_for(&server);

    let empty = backend.count_link_tokens("  ").await.unwrap_err();
    assert_eq!(empty.kind, FailureKind::InvalidInput);
    let bad = backend.count_link_tokens("not a url").await.unwrap_err();
    assert_eq!(bad.kind, FailureKind::InvalidUrl);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn token_count_surfaces_service_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/perplexity/count_tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false, "error": "page unreachable"
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .count_link_tokens("https://example.org/call.pdf")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Service);
    assert_eq!(err.message, "page unreachable");
}

#[tokio::test]
async fn search_returns_summary_and_remote_costs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/perplexity/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "summary": "Two calls found",
                "links": ["https://a.example"],
                "tokens_in": 1500,
                "estimated_cost_usd": 0.01,
                "estimated_cost_brl": 0.052
            }
        })))
        .mount(&server)
        .await;

    let result = backend_for(&server)
        .search(&search_request("list calls"))
        .await
        .unwrap();
    assert_eq!(result.summary.as_deref(), Some("Two calls found"));
    assert_eq!(result.links, vec!["https://a.example"]);
    assert_eq!(result.remote.tokens_in, Some(1500));
    assert_eq!(result.remote.cost_brl, Some(0.052));
}

#[tokio::test]
async fn blank_search_prompt_is_refused_locally() {
    let server = MockServer::start().await;
    let err = backend_for(&server)
        .search(&search_request("   "))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidInput);
}
