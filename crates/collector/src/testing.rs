//! Stub alert managers for tests

use axum::{http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DISK_FULL_BODY: &str = r#"[
    {"labels": {"uniq_id": "abc", "alertname": "disk-full", "Hostname": "db01"},
     "startsAt": "2024-01-01T10:00:00.000Z"}
]"#;

pub const CPU_HIGH_BODY: &str = r#"[
    {"labels": {"uniq_id": "abc", "alertname": "cpu-high", "Hostname": "db01"},
     "startsAt": "2024-01-01T09:00:00.000Z"},
    {"labels": {"uniq_id": "xyz", "alertname": "mem", "Hostname": "web01"},
     "startsAt": "2024-01-01T09:30:00.000Z"}
]"#;

/// Serve `body` with `status` on the alerts route after `delay`.
/// Returns the base URL.
pub async fn stub_source(status: StatusCode, body: &'static str, delay: Duration) -> String {
    serve(Router::new().route(
        "/api/v2/alerts",
        get(move || async move {
            tokio::time::sleep(delay).await;
            (status, body)
        }),
    ))
    .await
}

/// Requests currently being answered across a group of stubs, and the
/// most seen at once
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Like [`stub_source`] with a 200, recording each request in `in_flight`
/// for the whole of `delay`
pub async fn counting_source(
    body: &'static str,
    delay: Duration,
    in_flight: Arc<InFlight>,
) -> String {
    serve(Router::new().route(
        "/api/v2/alerts",
        get(move || {
            let in_flight = Arc::clone(&in_flight);
            async move {
                in_flight.enter();
                tokio::time::sleep(delay).await;
                in_flight.leave();
                (StatusCode::OK, body)
            }
        }),
    ))
    .await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on
pub async fn dead_source() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
