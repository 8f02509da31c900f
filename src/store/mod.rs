// region:    --- Modules
mod http;
mod memory;

pub use http::HttpRecordStore;
pub use memory::MemoryRecordStore;

// endregion: --- Modules

// region:    --- Record Store Trait
use async_trait::async_trait;

use crate::bidding::model::{BidLogEntry, Product};
use crate::error::StoreError;

/// The narrow interface the bidding core depends on for durable Product
/// records. Read-after-write consistency is assumed: `get` returns the
/// latest successfully written value.
///
/// `put` is a full replace of the record, never a delta merge; the
/// ledger always writes the complete post-bid state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, product_id: &str) -> Result<Product, StoreError>;
    async fn put(&self, product: &Product) -> Result<Product, StoreError>;
    async fn create(&self, product: &Product) -> Result<Product, StoreError>;
    async fn delete(&self, product_id: &str) -> Result<(), StoreError>;
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Append to the bid-history log kept apart from the live record.
    async fn log_bid(&self, entry: &BidLogEntry) -> Result<(), StoreError>;
}

// endregion: --- Record Store Trait
