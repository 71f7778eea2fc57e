//! Source Collector
//!
//! One request per endpoint, all in flight at once. A failing source is
//! logged and left out of the round; it is tried again next cycle.

use aggregator::{RawAlert, SourcePayload};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::error::CollectError;

/// Alertmanager v2 query returning only active, un-inhibited alerts
pub const DEFAULT_ALERTS_PATH: &str = "/api/v2/alerts?silenced=false&inhibited=false&group=uniq_id";

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Host names or base URLs of the alert managers
    pub sources: Vec<String>,
    /// Path and query appended to each source
    pub alerts_path: String,
    /// Per-request timeout (default: 10s)
    pub request_timeout: Duration,
    /// Cap on simultaneous requests, 0 for one task per source
    pub max_concurrent_requests: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            alerts_path: DEFAULT_ALERTS_PATH.to_string(),
            request_timeout: Duration::from_secs(10),
            max_concurrent_requests: 0,
        }
    }
}

/// Outcome of polling every source once
#[derive(Debug, Default)]
pub struct CollectionRound {
    /// Payloads of the sources that answered, in configuration order
    pub payloads: Vec<SourcePayload>,
    /// Sources that did not, with the reason
    pub failures: Vec<(String, CollectError)>,
}

impl CollectionRound {
    pub fn attempted(&self) -> usize {
        self.payloads.len() + self.failures.len()
    }

    /// True when sources were polled and none of them answered
    pub fn all_failed(&self) -> bool {
        self.payloads.is_empty() && !self.failures.is_empty()
    }
}

/// Polls the configured alert managers
pub struct SourceCollector {
    endpoints: Vec<Endpoint>,
    http: Client,
    timeout: Duration,
    limit: Option<Arc<Semaphore>>,
}

impl SourceCollector {
    /// Create a collector, rejecting any malformed endpoint
    pub fn new(config: CollectorConfig) -> Result<Self, CollectError> {
        let endpoints = config
            .sources
            .iter()
            .map(|entry| Endpoint::parse(entry, &config.alerts_path))
            .collect::<Result<Vec<_>, _>>()?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CollectError::Transport(e.to_string()))?;

        let limit = match config.max_concurrent_requests {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        info!(
            "Creating source collector: {} sources, timeout={:?}",
            endpoints.len(),
            config.request_timeout
        );

        Ok(Self {
            endpoints,
            http,
            timeout: config.request_timeout,
            limit,
        })
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Poll every source and wait until each has answered, failed, or
    /// timed out.
    pub async fn collect(&self) -> CollectionRound {
        let mut tasks = JoinSet::new();

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let http = self.http.clone();
            let url = endpoint.url.clone();
            let limit = self.limit.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = match limit {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                (index, fetch(&http, url, timeout).await)
            });
        }

        let mut results = Vec::with_capacity(self.endpoints.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!("Source task failed: {}", e),
            }
        }
        self.assemble(results)
    }

    /// Build the round in configuration order. An endpoint whose task
    /// reported nothing counts as a transport failure.
    fn assemble(&self, results: Vec<(usize, FetchResult)>) -> CollectionRound {
        let mut slots: Vec<Option<FetchResult>> = self.endpoints.iter().map(|_| None).collect();
        for (index, result) in results {
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(result);
            }
        }

        let mut round = CollectionRound::default();
        for (endpoint, slot) in self.endpoints.iter().zip(slots) {
            let name = endpoint.name.clone();
            let result = slot.unwrap_or_else(|| {
                Err(CollectError::Transport("collection task did not complete".to_string()))
            });
            match result {
                Ok(alerts) => {
                    debug!("Fetched {} alerts from {}", alerts.len(), name);
                    round.payloads.push(SourcePayload::new(name, alerts));
                }
                Err(e) => {
                    warn!("Error fetching from {}: {}", name, e);
                    metrics::counter!("alertdeck_source_failures_total", "reason" => e.reason())
                        .increment(1);
                    round.failures.push((name, e));
                }
            }
        }
        round
    }
}

type FetchResult = Result<Vec<RawAlert>, CollectError>;

async fn fetch(http: &Client, url: Url, timeout: Duration) -> FetchResult {
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            CollectError::Timeout(timeout.as_millis() as u64)
        } else {
            CollectError::Transport(e.to_string())
        }
    };

    let resp = http.get(url).send().await.map_err(classify)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(CollectError::Status(status.as_u16()));
    }

    let body = resp.bytes().await.map_err(classify)?;
    serde_json::from_slice(&body).map_err(|e| CollectError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{counting_source, dead_source, stub_source, InFlight, DISK_FULL_BODY};
    use axum::http::StatusCode;
    use std::time::Instant;

    fn config(sources: Vec<String>) -> CollectorConfig {
        CollectorConfig {
            sources,
            request_timeout: Duration::from_millis(500),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let result = SourceCollector::new(config(vec!["ok.example.com".into(), "".into()]));
        assert!(matches!(result, Err(CollectError::InvalidEndpoint { .. })));
    }

    #[tokio::test]
    async fn test_no_sources() {
        let collector = SourceCollector::new(config(Vec::new())).unwrap();
        let round = collector.collect().await;
        assert_eq!(round.attempted(), 0);
        assert!(!round.all_failed());
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let good = stub_source(StatusCode::OK, DISK_FULL_BODY, Duration::ZERO).await;
        let broken = stub_source(StatusCode::INTERNAL_SERVER_ERROR, "oops", Duration::ZERO).await;
        let garbage = stub_source(StatusCode::OK, "{not json", Duration::ZERO).await;
        let dead = dead_source().await;

        let collector =
            SourceCollector::new(config(vec![broken, good.clone(), garbage, dead])).unwrap();
        let round = collector.collect().await;

        assert_eq!(round.attempted(), 4);
        assert_eq!(round.payloads.len(), 1);
        assert_eq!(round.payloads[0].source, good);
        assert_eq!(round.payloads[0].alerts.len(), 1);

        let reasons: Vec<_> = round.failures.iter().map(|(_, e)| e.reason()).collect();
        assert_eq!(reasons, vec!["status", "decode", "transport"]);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let slow = stub_source(StatusCode::OK, DISK_FULL_BODY, Duration::from_secs(5)).await;
        let fast = stub_source(StatusCode::OK, DISK_FULL_BODY, Duration::ZERO).await;

        let collector = SourceCollector::new(config(vec![slow, fast])).unwrap();
        let started = Instant::now();
        let round = collector.collect().await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(round.payloads.len(), 1);
        assert!(matches!(round.failures[0].1, CollectError::Timeout(500)));
    }

    async fn peak_in_flight(max_concurrent_requests: usize) -> usize {
        let in_flight = Arc::new(InFlight::default());
        let mut sources = Vec::new();
        for _ in 0..4 {
            let delay = Duration::from_millis(100);
            sources.push(counting_source(DISK_FULL_BODY, delay, Arc::clone(&in_flight)).await);
        }

        let collector = SourceCollector::new(CollectorConfig {
            max_concurrent_requests,
            ..config(sources)
        })
        .unwrap();
        let round = collector.collect().await;
        assert_eq!(round.payloads.len(), 4);
        assert!(round.failures.is_empty());
        in_flight.peak()
    }

    #[tokio::test]
    async fn test_concurrency_cap() {
        assert_eq!(peak_in_flight(1).await, 1);
    }

    #[tokio::test]
    async fn test_uncapped_requests_overlap() {
        assert!(peak_in_flight(0).await > 1);
    }

    #[test]
    fn test_unreported_endpoint_counts_as_failure() {
        let collector = SourceCollector::new(config(vec![
            "a.example.com".into(),
            "b.example.com".into(),
            "c.example.com".into(),
        ]))
        .unwrap();

        // Endpoint 1's task never reported back
        let round = collector.assemble(vec![
            (2, Ok(Vec::new())),
            (0, Err(CollectError::Status(503))),
        ]);

        assert_eq!(round.attempted(), 3);
        assert_eq!(round.payloads.len(), 1);
        assert_eq!(round.payloads[0].source, "c.example.com");

        let failed: Vec<_> = round
            .failures
            .iter()
            .map(|(name, e)| (name.as_str(), e.reason()))
            .collect();
        assert_eq!(
            failed,
            vec![("a.example.com", "status"), ("b.example.com", "transport")]
        );
    }

    #[test]
    fn test_all_tasks_lost_is_total_failure() {
        let collector = SourceCollector::new(config(vec!["a.example.com".into()])).unwrap();
        let round = collector.assemble(Vec::new());
        assert!(round.all_failed());
    }
}
