//! Connection Store Module
//!
//! The registry of connections currently considered reachable, behind the
//! [`ConnectionStore`] trait so backends can be swapped or faked.

pub mod file;
pub mod memory;
pub mod types;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use types::{Connection, ConnectionId, ConnectionStore};

use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::Result;

/// Build the store backend selected by configuration
pub async fn from_config(config: &StoreConfig) -> Result<Arc<dyn ConnectionStore>> {
    let store: Arc<dyn ConnectionStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("store.path is required for the file backend"))?;
            Arc::new(FileStore::open(path).await?)
        }
    };

    Ok(store)
}
