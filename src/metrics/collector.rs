//! Metrics Collector

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use serde::Serialize;
use tracing::error;

use crate::dispatch::BroadcastReport;

/// Collects and exports gateway metrics
pub struct Metrics {
    prometheus_registry: Registry,

    connections_joined_total: IntCounter,
    connections_left_total: IntCounter,
    connections_pruned_total: IntCounter,
    active_sockets: IntGauge,
    broadcasts_total: IntCounter,
    deliveries_total: IntCounter,
    delivery_failures_total: IntCounter,
    store_errors_total: IntCounter,
    broadcast_duration: Histogram,
}

/// Counter values for the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub connections_joined: u64,
    pub connections_left: u64,
    pub connections_pruned: u64,
    pub active_sockets: i64,
    pub broadcasts: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
    pub store_errors: u64,
}

impl Metrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Self {
        let prometheus_registry = Registry::new();

        let connections_joined_total = IntCounter::new(
            "fanout_connections_joined_total",
            "Connections registered in the store"
        ).expect("Failed to create connections_joined_total counter");

        let connections_left_total = IntCounter::new(
            "fanout_connections_left_total",
            "Connections removed on disconnect"
        ).expect("Failed to create connections_left_total counter");

        let connections_pruned_total = IntCounter::new(
            "fanout_connections_pruned_total",
            "Connections removed after delivery reported them gone"
        ).expect("Failed to create connections_pruned_total counter");

        let active_sockets = IntGauge::new(
            "fanout_active_sockets",
            "Currently open WebSocket connections"
        ).expect("Failed to create active_sockets gauge");

        let broadcasts_total = IntCounter::new(
            "fanout_broadcasts_total",
            "Inbound messages fanned out"
        ).expect("Failed to create broadcasts_total counter");

        let deliveries_total = IntCounter::new(
            "fanout_deliveries_total",
            "Successful per-recipient deliveries"
        ).expect("Failed to create deliveries_total counter");

        let delivery_failures_total = IntCounter::new(
            "fanout_delivery_failures_total",
            "Failed per-recipient deliveries"
        ).expect("Failed to create delivery_failures_total counter");

        let store_errors_total = IntCounter::new(
            "fanout_store_errors_total",
            "Connection store operations that failed"
        ).expect("Failed to create store_errors_total counter");

        let broadcast_duration = Histogram::with_opts(
            HistogramOpts::new(
                "fanout_broadcast_duration_seconds",
                "Time from store scan to last settled delivery"
            ).buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
        ).expect("Failed to create broadcast_duration histogram");

        prometheus_registry.register(Box::new(connections_joined_total.clone()))
            .expect("Failed to register connections_joined_total");
        prometheus_registry.register(Box::new(connections_left_total.clone()))
            .expect("Failed to register connections_left_total");
        prometheus_registry.register(Box::new(connections_pruned_total.clone()))
            .expect("Failed to register connections_pruned_total");
        prometheus_registry.register(Box::new(active_sockets.clone()))
            .expect("Failed to register active_sockets");
        prometheus_registry.register(Box::new(broadcasts_total.clone()))
            .expect("Failed to register broadcasts_total");
        prometheus_registry.register(Box::new(deliveries_total.clone()))
            .expect("Failed to register deliveries_total");
        prometheus_registry.register(Box::new(delivery_failures_total.clone()))
            .expect("Failed to register delivery_failures_total");
        prometheus_registry.register(Box::new(store_errors_total.clone()))
            .expect("Failed to register store_errors_total");
        prometheus_registry.register(Box::new(broadcast_duration.clone()))
            .expect("Failed to register broadcast_duration");

        Self {
            prometheus_registry,
            connections_joined_total,
            connections_left_total,
            connections_pruned_total,
            active_sockets,
            broadcasts_total,
            deliveries_total,
            delivery_failures_total,
            store_errors_total,
            broadcast_duration,
        }
    }

    pub fn record_join(&self) {
        self.connections_joined_total.inc();
    }

    pub fn record_leave(&self) {
        self.connections_left_total.inc();
    }

    pub fn record_pruned(&self) {
        self.connections_pruned_total.inc();
    }

    pub fn record_store_error(&self) {
        self.store_errors_total.inc();
    }

    pub fn socket_opened(&self) {
        self.active_sockets.inc();
    }

    pub fn socket_closed(&self) {
        self.active_sockets.dec();
    }

    /// Record the outcome of one fan-out
    pub fn record_broadcast(&self, report: &BroadcastReport) {
        self.broadcasts_total.inc();
        self.deliveries_total.inc_by(report.delivered.len() as u64);
        self.delivery_failures_total.inc_by(report.failures.len() as u64);
        self.broadcast_duration.observe(report.elapsed.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_joined: self.connections_joined_total.get(),
            connections_left: self.connections_left_total.get(),
            connections_pruned: self.connections_pruned_total.get(),
            active_sockets: self.active_sockets.get(),
            broadcasts: self.broadcasts_total.get(),
            deliveries: self.deliveries_total.get(),
            delivery_failures: self.delivery_failures_total.get(),
            store_errors: self.store_errors_total.get(),
        }
    }

    /// Render all metrics in the Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.prometheus_registry.gather();

        match encoder.encode_to_string(&metric_families) {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Failed to encode Prometheus metrics");
                String::new()
            }
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
