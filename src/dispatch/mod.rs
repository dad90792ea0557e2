//! Broadcast Dispatch Module
//!
//! Fan-out of one inbound message to every registered connection.

pub mod dispatcher;
pub mod report;

pub use dispatcher::BroadcastDispatcher;
pub use report::{BroadcastReport, DeliveryFailure};
