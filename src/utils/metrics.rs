//! Observability and Metrics
//!
//! Counters for session lifecycle and packet traffic.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for protocol operations
#[derive(Debug)]
pub struct Metrics {
    /// Sessions created by an open request
    pub sessions_opened: AtomicU64,
    /// Sessions removed by an explicit close
    pub sessions_closed: AtomicU64,
    /// Sessions swept because their TTL elapsed
    pub sessions_expired: AtomicU64,
    /// Acknowledge requests passed to the handler
    pub requests_handled: AtomicU64,
    /// Acknowledge requests answered with an in-band session error
    pub requests_rejected: AtomicU64,
    /// Frames written
    pub packets_sent: AtomicU64,
    /// Frames read
    pub packets_received: AtomicU64,
    /// Frames that failed validation
    pub corrupt_packets: AtomicU64,
    /// Client calls that hit the reply deadline
    pub transmit_timeouts: AtomicU64,
    /// Socket failures other than a clean disconnect
    pub transport_errors: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            sessions_opened: AtomicU64::new(0),
            sessions_closed: AtomicU64::new(0),
            sessions_expired: AtomicU64::new(0),
            requests_handled: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            packets_sent: AtomicU64::new(0),
            packets_received: AtomicU64::new(0),
            corrupt_packets: AtomicU64::new(0),
            transmit_timeouts: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sessions_expired(&self, count: u64) {
        self.sessions_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn request_handled(&self) {
        self.requests_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packet_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn corrupt_packet(&self) {
        self.corrupt_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transmit_timeout(&self) {
        self.transmit_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            sessions_expired: self.sessions_expired.load(Ordering::Relaxed),
            requests_handled: self.requests_handled.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            corrupt_packets: self.corrupt_packets.load(Ordering::Relaxed),
            transmit_timeouts: self.transmit_timeouts.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            sessions_opened = snapshot.sessions_opened,
            sessions_closed = snapshot.sessions_closed,
            sessions_expired = snapshot.sessions_expired,
            requests_handled = snapshot.requests_handled,
            requests_rejected = snapshot.requests_rejected,
            packets_sent = snapshot.packets_sent,
            packets_received = snapshot.packets_received,
            corrupt_packets = snapshot.corrupt_packets,
            transmit_timeouts = snapshot.transmit_timeouts,
            transport_errors = snapshot.transport_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Session metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub sessions_expired: u64,
    pub requests_handled: u64,
    pub requests_rejected: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub corrupt_packets: u64,
    pub transmit_timeouts: u64,
    pub transport_errors: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.session_opened();
        metrics.session_opened();
        metrics.sessions_expired(3);
        metrics.request_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_opened, 2);
        assert_eq!(snapshot.sessions_expired, 3);
        assert_eq!(snapshot.requests_rejected, 1);
        assert_eq!(snapshot.requests_handled, 0);
    }
}
