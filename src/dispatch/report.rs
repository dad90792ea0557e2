//! Broadcast outcome types

use std::time::Duration;

use crate::error::GatewayError;
use crate::store::ConnectionId;
use crate::transport::DeliveryError;

/// One recipient that could not be reached during a broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub target: ConnectionId,
    pub error: DeliveryError,
}

impl From<DeliveryFailure> for GatewayError {
    fn from(failure: DeliveryFailure) -> Self {
        GatewayError::DeliveryFailure {
            target: failure.target,
            source: failure.error,
        }
    }
}

/// Per-target observations collected from a single broadcast
#[derive(Debug, Clone)]
pub struct BroadcastReport {
    pub sender: ConnectionId,
    pub delivered: Vec<ConnectionId>,
    pub failures: Vec<DeliveryFailure>,
    pub elapsed: Duration,
}

impl BroadcastReport {
    /// Number of connections in the enumerated snapshot
    pub fn recipients(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Targets whose failure means the transport no longer knows them
    pub fn gone(&self) -> impl Iterator<Item = &ConnectionId> {
        self.failures
            .iter()
            .filter(|f| f.error.is_gone())
            .map(|f| &f.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_and_gone_filter() {
        let report = BroadcastReport {
            sender: "b".into(),
            delivered: vec!["a".into(), "b".into()],
            failures: vec![
                DeliveryFailure {
                    target: "c".into(),
                    error: DeliveryError::Gone,
                },
                DeliveryFailure {
                    target: "d".into(),
                    error: DeliveryError::Timeout(Duration::from_secs(5)),
                },
            ],
            elapsed: Duration::ZERO,
        };

        assert_eq!(report.recipients(), 4);
        assert!(!report.is_complete());
        let gone: Vec<_> = report.gone().cloned().collect();
        assert_eq!(gone, vec![ConnectionId::from("c")]);
    }

    #[test]
    fn test_failure_converts_to_gateway_error() {
        let failure = DeliveryFailure {
            target: "c".into(),
            error: DeliveryError::Timeout(Duration::from_secs(5)),
        };

        let err = GatewayError::from(failure);
        assert!(matches!(
            &err,
            GatewayError::DeliveryFailure { target, source: DeliveryError::Timeout(_) }
                if *target == ConnectionId::from("c")
        ));
        assert_eq!(err.to_string(), "delivery to c failed: delivery timed out after 5s");
    }
}
