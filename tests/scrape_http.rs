// tests/scrape_http.rs
//
// HTTP scrape provider against an in-process sidecar on 127.0.0.1:0,
// plus the retry/timeout policy wrapped around it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use dividend_tracker::model::Company;
use dividend_tracker::scrape::{
    HttpScrapeProvider, PolicyProvider, ScrapeError, ScrapePolicy, ScrapeProvider,
};

#[derive(Clone, Default)]
struct Sidecar {
    history_calls: Arc<AtomicUsize>,
}

async fn company(Path(ticker): Path<String>) -> Response {
    match ticker.as_str() {
        "KO" => Json(json!({ "ticker": "KO", "name": "Coca-Cola" })).into_response(),
        "BRK/B" => Json(json!({ "ticker": "BRK/B", "name": "Berkshire Hathaway" })).into_response(),
        "SLOW" => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({ "ticker": "SLOW", "name": "Slow Corp" })).into_response()
        }
        "BROKEN" => (StatusCode::OK, "not json").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn history(State(s): State<Sidecar>, Path(ticker): Path<String>) -> Response {
    let n = s.history_calls.fetch_add(1, Ordering::SeqCst);
    match ticker.as_str() {
        "KO" => Json(json!({
            "company": { "ticker": "KO", "name": "Coca-Cola" },
            "dividends": [ { "date": "2024-03-14", "amount": "0.485" } ]
        }))
        .into_response(),
        // first call fails, later calls succeed
        "FLAKY" if n == 0 => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "FLAKY" => Json(json!({
            "company": { "ticker": "FLAKY", "name": "Flaky Inc." },
            "dividends": []
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_sidecar() -> (String, Sidecar) {
    let state = Sidecar::default();
    let app = Router::new()
        .route("/companies/{ticker}", get(company))
        .route("/companies/{ticker}/dividends", get(history))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind sidecar");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn resolves_and_fetches_history() {
    let (base, _) = spawn_sidecar().await;
    let p = HttpScrapeProvider::new(&base, Duration::from_secs(2)).unwrap();

    let company = p.resolve_by_ticker("KO").await.unwrap().expect("KO resolves");
    assert_eq!(company, Company::new("KO", "Coca-Cola"));

    let scraped = p.fetch_history(&company).await.unwrap();
    assert_eq!(scraped.company, company);
    assert_eq!(scraped.dividends.len(), 1);
    assert_eq!(scraped.dividends[0].amount.to_string(), "0.485");
}

#[tokio::test]
async fn unknown_ticker_and_bad_payloads() {
    let (base, _) = spawn_sidecar().await;
    let p = HttpScrapeProvider::new(&base, Duration::from_secs(2)).unwrap();

    assert_eq!(p.resolve_by_ticker("ZZZZ").await.unwrap(), None);
    assert_eq!(
        p.fetch_history(&Company::new("ZZZZ", "Nobody")).await,
        Err(ScrapeError::UnknownTicker("ZZZZ".into()))
    );
    assert!(matches!(
        p.resolve_by_ticker("BROKEN").await,
        Err(ScrapeError::Malformed(_))
    ));
}

#[tokio::test]
async fn ticker_with_slash_stays_one_segment() {
    let (base, _) = spawn_sidecar().await;
    let p = HttpScrapeProvider::new(&base, Duration::from_secs(2)).unwrap();
    let company = p.resolve_by_ticker("BRK/B").await.unwrap();
    assert_eq!(company.map(|c| c.name), Some("Berkshire Hathaway".to_string()));
}

#[tokio::test]
async fn policy_times_out_slow_provider() {
    let (base, _) = spawn_sidecar().await;
    let http = HttpScrapeProvider::new(&base, Duration::from_secs(5)).unwrap();
    let p = PolicyProvider::new(
        http,
        ScrapePolicy {
            timeout: Duration::from_millis(100),
            retries: 0,
            backoff: Duration::from_millis(10),
        },
    );

    let err = p.resolve_by_ticker("SLOW").await.unwrap_err();
    assert_eq!(err, ScrapeError::Timeout(100));
}

#[tokio::test]
async fn policy_retries_transient_upstream_failure() {
    let (base, sidecar) = spawn_sidecar().await;
    let company = Company::new("FLAKY", "Flaky Inc.");

    let no_retry = PolicyProvider::new(
        HttpScrapeProvider::new(&base, Duration::from_secs(2)).unwrap(),
        ScrapePolicy {
            retries: 0,
            ..ScrapePolicy::default()
        },
    );
    assert_eq!(
        no_retry.fetch_history(&company).await,
        Err(ScrapeError::Upstream(503))
    );

    sidecar.history_calls.store(0, Ordering::SeqCst);
    let retrying = PolicyProvider::new(
        HttpScrapeProvider::new(&base, Duration::from_secs(2)).unwrap(),
        ScrapePolicy {
            timeout: Duration::from_secs(2),
            retries: 2,
            backoff: Duration::from_millis(10),
        },
    );
    let scraped = retrying.fetch_history(&company).await.unwrap();
    assert_eq!(scraped.company, company);
    assert_eq!(sidecar.history_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn policy_does_not_retry_unknown_ticker() {
    let (base, sidecar) = spawn_sidecar().await;
    let p = PolicyProvider::new(
        HttpScrapeProvider::new(&base, Duration::from_secs(2)).unwrap(),
        ScrapePolicy {
            timeout: Duration::from_secs(2),
            retries: 3,
            backoff: Duration::from_millis(10),
        },
    );
    let err = p
        .fetch_history(&Company::new("GONE", "Gone Ltd."))
        .await
        .unwrap_err();
    assert_eq!(err, ScrapeError::UnknownTicker("GONE".into()));
    assert_eq!(sidecar.history_calls.load(Ordering::SeqCst), 1);
}
