//! Simple metrics collection for observability
//!
//! Lightweight atomic counters, exported in Prometheus text format at
//! `GET /metrics`. Recording never allocates.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

const OPERATIONS: usize = 4;
const OUTCOMES: usize = 4;

/// Operations exposed by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Spin,
    Claim,
    Status,
}

impl Operation {
    const ALL: [Operation; OPERATIONS] = [
        Operation::Register,
        Operation::Spin,
        Operation::Claim,
        Operation::Status,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Spin => "spin",
            Operation::Claim => "claim",
            Operation::Status => "status",
        }
    }
}

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Granted,
    /// Quota exhausted
    Denied,
    /// Rejected input
    Invalid,
    /// Store failure
    Failed,
}

impl Outcome {
    const ALL: [Outcome; OUTCOMES] = [
        Outcome::Granted,
        Outcome::Denied,
        Outcome::Invalid,
        Outcome::Failed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Granted => "granted",
            Outcome::Denied => "denied",
            Outcome::Invalid => "invalid",
            Outcome::Failed => "failed",
        }
    }
}

/// Core metrics collected by the server
pub struct Metrics {
    start_time: Instant,

    /// Requests by operation and outcome
    outcomes: [[AtomicU64; OUTCOMES]; OPERATIONS],

    /// Request latency buckets (in microseconds)
    pub latency_under_1ms: AtomicU64,
    pub latency_under_10ms: AtomicU64,
    pub latency_under_100ms: AtomicU64,
    pub latency_under_1s: AtomicU64,
    pub latency_over_1s: AtomicU64,
    pub latency_sum_micros: AtomicU64,
    pub latency_count: AtomicU64,

    /// Highest coupon serial handed out by this process
    pub last_coupon_serial: AtomicU64,
    pub new_identities: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            outcomes: std::array::from_fn(|_| std::array::from_fn(|_| AtomicU64::new(0))),
            latency_under_1ms: AtomicU64::new(0),
            latency_under_10ms: AtomicU64::new(0),
            latency_under_100ms: AtomicU64::new(0),
            latency_under_1s: AtomicU64::new(0),
            latency_over_1s: AtomicU64::new(0),
            latency_sum_micros: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            last_coupon_serial: AtomicU64::new(0),
            new_identities: AtomicU64::new(0),
        }
    }

    /// Record a finished request and its latency
    pub fn record(&self, operation: Operation, outcome: Outcome, latency_us: u64) {
        self.counter(operation, outcome)
            .fetch_add(1, Ordering::Relaxed);

        match latency_us {
            0..=999 => self.latency_under_1ms.fetch_add(1, Ordering::Relaxed),
            1000..=9999 => self.latency_under_10ms.fetch_add(1, Ordering::Relaxed),
            10000..=99999 => self.latency_under_100ms.fetch_add(1, Ordering::Relaxed),
            100000..=999999 => self.latency_under_1s.fetch_add(1, Ordering::Relaxed),
            _ => self.latency_over_1s.fetch_add(1, Ordering::Relaxed),
        };

        self.latency_sum_micros
            .fetch_add(latency_us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coupon(&self, serial: u64) {
        self.last_coupon_serial.fetch_max(serial, Ordering::Relaxed);
    }

    pub fn record_new_identity(&self) {
        self.new_identities.fetch_add(1, Ordering::Relaxed);
    }

    /// Count of requests with the given operation and outcome
    pub fn count(&self, operation: Operation, outcome: Outcome) -> u64 {
        self.counter(operation, outcome).load(Ordering::Relaxed)
    }

    fn counter(&self, operation: Operation, outcome: Outcome) -> &AtomicU64 {
        &self.outcomes[operation as usize][outcome as usize]
    }

    pub fn total_requests(&self) -> u64 {
        self.latency_count.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        // Writing to a String cannot fail
        let _ = self.write_prometheus(&mut output);
        output
    }

    fn write_prometheus(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# HELP spinwheel_uptime_seconds Time since server start in seconds")?;
        writeln!(out, "# TYPE spinwheel_uptime_seconds gauge")?;
        writeln!(out, "spinwheel_uptime_seconds {}\n", self.uptime_seconds())?;

        writeln!(out, "# HELP spinwheel_requests_total Total number of requests processed")?;
        writeln!(out, "# TYPE spinwheel_requests_total counter")?;
        writeln!(out, "spinwheel_requests_total {}\n", self.total_requests())?;

        writeln!(out, "# HELP spinwheel_operations_total Requests by operation and outcome")?;
        writeln!(out, "# TYPE spinwheel_operations_total counter")?;
        for operation in Operation::ALL {
            for outcome in Outcome::ALL {
                writeln!(
                    out,
                    "spinwheel_operations_total{{operation=\"{}\",outcome=\"{}\"}} {}",
                    operation.as_str(),
                    outcome.as_str(),
                    self.count(operation, outcome)
                )?;
            }
        }
        writeln!(out)?;

        let under_1ms = self.latency_under_1ms.load(Ordering::Relaxed);
        let under_10ms = under_1ms + self.latency_under_10ms.load(Ordering::Relaxed);
        let under_100ms = under_10ms + self.latency_under_100ms.load(Ordering::Relaxed);
        let under_1s = under_100ms + self.latency_under_1s.load(Ordering::Relaxed);

        writeln!(out, "# HELP spinwheel_request_duration_seconds Request latency distribution")?;
        writeln!(out, "# TYPE spinwheel_request_duration_seconds histogram")?;
        writeln!(out, "spinwheel_request_duration_seconds_bucket{{le=\"0.001\"}} {under_1ms}")?;
        writeln!(out, "spinwheel_request_duration_seconds_bucket{{le=\"0.01\"}} {under_10ms}")?;
        writeln!(out, "spinwheel_request_duration_seconds_bucket{{le=\"0.1\"}} {under_100ms}")?;
        writeln!(out, "spinwheel_request_duration_seconds_bucket{{le=\"1\"}} {under_1s}")?;
        writeln!(
            out,
            "spinwheel_request_duration_seconds_bucket{{le=\"+Inf\"}} {}",
            self.total_requests()
        )?;
        let latency_sum_seconds =
            self.latency_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        writeln!(out, "spinwheel_request_duration_seconds_sum {latency_sum_seconds:.6}")?;
        writeln!(
            out,
            "spinwheel_request_duration_seconds_count {}\n",
            self.total_requests()
        )?;

        writeln!(out, "# HELP spinwheel_last_coupon_serial Highest coupon serial issued")?;
        writeln!(out, "# TYPE spinwheel_last_coupon_serial gauge")?;
        writeln!(
            out,
            "spinwheel_last_coupon_serial {}\n",
            self.last_coupon_serial.load(Ordering::Relaxed)
        )?;

        writeln!(out, "# HELP spinwheel_new_identities_total Participants registered for the first time")?;
        writeln!(out, "# TYPE spinwheel_new_identities_total counter")?;
        writeln!(
            out,
            "spinwheel_new_identities_total {}",
            self.new_identities.load(Ordering::Relaxed)
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
