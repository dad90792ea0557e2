//! Connection Lifecycle Module
//!
//! Arrival and departure of clients. The only writer of the connection store.

pub mod manager;

pub use manager::LifecycleManager;
