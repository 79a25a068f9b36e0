//! Prometheus metrics for the archive QA CLI.
//!
//! Exposes:
//! - `archive_qa_command_duration_seconds` (histogram)
//! - `archive_qa_command_total` (counter with status)
//! - `archive_qa_command_inflight` (gauge)
//! - `archive_qa_graph_queries_total` (counter by backend and status)
//! - `archive_qa_inference_requests_total` (counter by status)
//! - `archive_qa_cache_lookups_total` (counter by cache and result)
//! - process metrics from the `process` collector

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter_vec, register_int_gauge_vec,
    Encoder, HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Process collector unavailable: {}", err);
    }
});

fn counter(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    register_int_counter_vec!(name, help, labels)
        .unwrap_or_else(|err| panic!("metric {name} registration: {err}"))
}

/// 50 ms doubling up to roughly three minutes.
static COMMAND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = prometheus::exponential_buckets(0.05, 2.0, 14).expect("valid bucket layout");
    register_histogram_vec!(
        "archive_qa_command_duration_seconds",
        "Wall time of CLI commands in seconds",
        &["command"],
        buckets
    )
    .expect("command duration histogram")
});

static COMMAND_INFLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "archive_qa_command_inflight",
        "CLI commands currently running",
        &["command"]
    )
    .expect("command inflight gauge")
});

static COMMAND_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "archive_qa_command_total",
        "Finished CLI commands by outcome",
        &["command", "status"],
    )
});

static GRAPH_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "archive_qa_graph_queries_total",
        "SELECT queries by graph backend and outcome",
        &["backend", "status"],
    )
});

static INFERENCE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "archive_qa_inference_requests_total",
        "Text-generation calls by outcome",
        &["status"],
    )
});

static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    counter(
        "archive_qa_cache_lookups_total",
        "Memoization lookups by cache and result",
        &["cache", "result"],
    )
});

fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&COMMAND_DURATION);
    Lazy::force(&COMMAND_INFLIGHT);
    Lazy::force(&COMMAND_TOTAL);
    Lazy::force(&GRAPH_QUERIES);
    Lazy::force(&INFERENCE_REQUESTS);
    Lazy::force(&CACHE_LOOKUPS);
}

fn outcome(success: bool) -> &'static str {
    if success {
        "ok"
    } else {
        "error"
    }
}

pub fn record_graph_query(backend: &'static str, success: bool) {
    init_collectors();
    GRAPH_QUERIES
        .with_label_values(&[backend, outcome(success)])
        .inc();
}

/// `status` is one of `ok`, `error`, `malformed`.
pub fn record_inference(status: &'static str) {
    init_collectors();
    INFERENCE_REQUESTS.with_label_values(&[status]).inc();
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    init_collectors();
    let result = if hit { "hit" } else { "miss" };
    CACHE_LOOKUPS.with_label_values(&[cache, result]).inc();
}

pub fn record_command_start(command: &'static str) {
    init_collectors();
    COMMAND_INFLIGHT.with_label_values(&[command]).inc();
}

pub fn record_command_result(command: &'static str, duration: Duration, success: bool) {
    init_collectors();
    COMMAND_INFLIGHT.with_label_values(&[command]).dec();
    COMMAND_DURATION
        .with_label_values(&[command])
        .observe(duration.as_secs_f64());
    COMMAND_TOTAL
        .with_label_values(&[command, outcome(success)])
        .inc();
}

type MetricsResponse = Response<Full<Bytes>>;

fn respond(status: StatusCode, body: impl Into<Bytes>) -> MetricsResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

/// Text exposition of the default registry.
fn exposition() -> MetricsResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("Metrics encoding failed: {}", err);
        return respond(StatusCode::INTERNAL_SERVER_ERROR, "encode error");
    }

    let mut response = respond(StatusCode::OK, buffer);
    if let Ok(content_type) = HeaderValue::from_str(encoder.format_type()) {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

async fn route(req: Request<Incoming>) -> Result<MetricsResponse, Infallible> {
    Ok(match req.uri().path() {
        "/metrics" => exposition(),
        _ => respond(StatusCode::NOT_FOUND, Bytes::new()),
    })
}

async fn serve_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Serving /metrics");

    loop {
        let (stream, peer) = listener.accept().await?;
        tokio::spawn(async move {
            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service_fn(route));
            if let Err(err) = conn.await {
                warn!(?peer, "Metrics connection closed with error: {}", err);
            }
        });
    }
}

/// Serve `/metrics` on `addr` in a background task.
pub fn spawn_metrics_server(addr: SocketAddr) {
    init_collectors();
    tokio::spawn(async move {
        if let Err(err) = serve_metrics(addr).await {
            error!(%addr, "Metrics endpoint stopped: {}", err);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn scrape() -> String {
        let response = exposition();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect metrics body")
            .to_bytes();
        String::from_utf8(body.to_vec()).expect("utf-8 metrics body")
    }

    #[test]
    fn command_lifecycle_updates_inflight_and_totals() {
        let cmd = "test_ask_lifecycle";

        record_command_start(cmd);
        assert_eq!(COMMAND_INFLIGHT.with_label_values(&[cmd]).get(), 1);

        record_command_result(cmd, Duration::from_millis(120), true);
        record_command_start(cmd);
        record_command_result(cmd, Duration::from_secs(2), false);

        assert_eq!(COMMAND_INFLIGHT.with_label_values(&[cmd]).get(), 0);
        assert_eq!(COMMAND_TOTAL.with_label_values(&[cmd, "ok"]).get(), 1);
        assert_eq!(COMMAND_TOTAL.with_label_values(&[cmd, "error"]).get(), 1);
        assert_eq!(
            COMMAND_DURATION.with_label_values(&[cmd]).get_sample_count(),
            2
        );
    }

    #[test]
    fn graph_queries_counted_per_backend() {
        record_graph_query("test_backend", true);
        record_graph_query("test_backend", false);
        record_graph_query("test_backend", false);

        assert_eq!(GRAPH_QUERIES.with_label_values(&["test_backend", "ok"]).get(), 1);
        assert_eq!(GRAPH_QUERIES.with_label_values(&["test_backend", "error"]).get(), 2);
    }

    #[test]
    fn cache_lookups_split_hits_and_misses() {
        record_cache_lookup("test_cache", true);
        record_cache_lookup("test_cache", false);

        assert_eq!(CACHE_LOOKUPS.with_label_values(&["test_cache", "hit"]).get(), 1);
        assert_eq!(CACHE_LOOKUPS.with_label_values(&["test_cache", "miss"]).get(), 1);
    }

    #[tokio::test]
    async fn scrape_exposes_domain_metrics() {
        record_command_start("test_scrape");
        record_command_result("test_scrape", Duration::from_millis(10), true);
        record_inference("malformed");

        let text = scrape().await;
        assert!(text.contains("archive_qa_command_total"));
        assert!(text.contains("archive_qa_command_duration_seconds"));
        assert!(text.contains("archive_qa_inference_requests_total"));
        assert!(text.contains("test_scrape"));
    }
}
