//! Gateway Module
//!
//! Routes inbound transport events to the lifecycle manager and the
//! broadcast dispatcher.

pub mod router;

pub use router::{EventOutcome, Gateway, GatewayEvent};
