// # Subscriber Store Implementations
//
// Implementations of the SubscriberStore trait for different persistence
// strategies, plus `open_store` to build one from configuration.

pub mod file;
pub mod memory;

pub use file::FileSubscriberStore;
pub use memory::MemorySubscriberStore;

use crate::config::StoreConfig;
use crate::traits::SubscriberStore;

/// Open the subscriber store described by `config`
pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn SubscriberStore>, crate::Error> {
    match config {
        StoreConfig::File { path } => {
            tracing::info!("Using file subscriber store at {}", path);
            Ok(Box::new(FileSubscriberStore::new(path).await?))
        }
        StoreConfig::Memory => {
            tracing::info!("Using in-memory subscriber store");
            Ok(Box::new(MemorySubscriberStore::new()))
        }
    }
}
