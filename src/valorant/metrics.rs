use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, info_span};

/// Counts outbound ranking API requests and logs the rate once a minute.
#[derive(Debug)]
pub struct RequestMetrics {
    start: Instant,
    count: AtomicU64,
    rate_limited: AtomicU64,
}

impl RequestMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            count: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
        })
    }

    pub fn inc(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn total_rate_limited(&self) -> u64 {
        self.rate_limited.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.total(),
            rate_limited: self.total_rate_limited(),
            elapsed: self.start.elapsed(),
        }
    }

    pub async fn log_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let snapshot = self.snapshot();
            info_span!("📊 ", client = "valorant").in_scope(|| {
                info!(
                    requests = snapshot.requests,
                    rate_limited = snapshot.rate_limited,
                    "{}",
                    snapshot
                )
            });
        }
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub rate_limited: u64,
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    pub fn per_minute(&self) -> f64 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.requests as f64 / minutes
        } else {
            0.0
        }
    }

    /// Percentage of requests answered with 429.
    pub fn rate_limited_share(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.rate_limited as f64 * 100.0 / self.requests as f64
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests (avg {:.2} req/min), {} rate limited ({:.1}%)",
            self.requests,
            self.per_minute(),
            self.rate_limited,
            self.rate_limited_share()
        )
    }
}
