// region:    --- Imports
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::bidding::model::{BidLogEntry, Product};
use crate::error::StoreError;
use crate::store::RecordStore;

// endregion: --- Imports

// region:    --- Memory Record Store

/// In-memory record store used by the test suite and standalone runs.
/// Honors the same read-after-write contract as the HTTP store.
#[derive(Default)]
pub struct MemoryRecordStore {
    products: RwLock<HashMap<String, Product>>,
    bid_log: RwLock<Vec<BidLogEntry>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated bid-history log, in append order.
    pub async fn bid_log(&self) -> Vec<BidLogEntry> {
        self.bid_log.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, product_id: &str) -> Result<Product, StoreError> {
        self.products
            .read()
            .await
            .get(product_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))
    }

    async fn put(&self, product: &Product) -> Result<Product, StoreError> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(StoreError::NotFound(product.id.clone()));
        }
        products.insert(product.id.clone(), product.clone());
        Ok(product.clone())
    }

    async fn create(&self, product: &Product) -> Result<Product, StoreError> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(product.clone())
    }

    async fn delete(&self, product_id: &str) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .remove(product_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn log_bid(&self, entry: &BidLogEntry) -> Result<(), StoreError> {
        self.bid_log.write().await.push(entry.clone());
        Ok(())
    }
}

// endregion: --- Memory Record Store

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::model::{Auction, ProductDuration};
    use chrono::Utc;

    fn product(id: &str) -> Product {
        Product {
            id: id.into(),
            title: "Lamp".into(),
            description: String::new(),
            image: String::new(),
            base_price: 10.0,
            duration: ProductDuration::default(),
            state: None,
            auction: Auction {
                start_time: Utc::now(),
                end_time: None,
                current_price: 10.0,
                bids: vec![],
                winner_id: None,
            },
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn get_returns_the_latest_written_value() {
        let store = MemoryRecordStore::new();
        store.create(&product("p1")).await.unwrap();

        let mut updated = product("p1");
        updated.auction.current_price = 25.0;
        store.put(&updated).await.unwrap();

        assert_eq!(store.get("p1").await.unwrap().auction.current_price, 25.0);
    }

    #[tokio::test]
    async fn missing_records_surface_not_found() {
        let store = MemoryRecordStore::new();
        assert!(matches!(
            store.get("nope").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.put(&product("nope")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn bid_log_preserves_append_order() {
        let store = MemoryRecordStore::new();
        for user in ["a", "b", "c"] {
            store
                .log_bid(&BidLogEntry {
                    user_id: user.into(),
                    product_id: "p1".into(),
                    bid_id: Utc::now(),
                    timestamp: Utc::now(),
                })
                .await
                .unwrap();
        }
        let log = store.bid_log().await;
        assert_eq!(
            log.iter().map(|e| e.user_id.as_str()).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }
}
