//! Metrics Module
//!
//! Prometheus counters for registry and broadcast activity.

pub mod collector;

pub use collector::{Metrics, MetricsSnapshot};
