// region:    --- Imports
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use tracing::info;

use crate::bidding::model::{BidLogEntry, Product};
use crate::error::StoreError;
use crate::store::RecordStore;

// endregion: --- Imports

// region:    --- HTTP Record Store

/// Record store client speaking REST to a generic JSON store
/// (`/products` for the live records, `/productBids` for the history
/// log), as deployed alongside the original viewers.
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn product_url(&self, product_id: &str) -> String {
        format!("{}/products/{}", self.base_url, product_id)
    }

    fn check(
        response: reqwest::Response,
        product_id: &str,
    ) -> Result<reqwest::Response, StoreError> {
        match response.status() {
            s if s.is_success() => Ok(response),
            reqwest::StatusCode::NOT_FOUND => Err(StoreError::NotFound(product_id.to_string())),
            s => Err(StoreError::Status(
                StatusCode::from_u16(s.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            )),
        }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn get(&self, product_id: &str) -> Result<Product, StoreError> {
        let response = self.client.get(self.product_url(product_id)).send().await?;
        Ok(Self::check(response, product_id)?.json().await?)
    }

    async fn put(&self, product: &Product) -> Result<Product, StoreError> {
        let response = self
            .client
            .put(self.product_url(&product.id))
            .json(product)
            .send()
            .await?;
        Ok(Self::check(response, &product.id)?.json().await?)
    }

    async fn create(&self, product: &Product) -> Result<Product, StoreError> {
        info!("{:<12} --> creating product {}", "Store", product.id);
        let response = self
            .client
            .post(format!("{}/products", self.base_url))
            .json(product)
            .send()
            .await?;
        Ok(Self::check(response, &product.id)?.json().await?)
    }

    async fn delete(&self, product_id: &str) -> Result<(), StoreError> {
        info!("{:<12} --> deleting product {}", "Store", product_id);
        let response = self
            .client
            .delete(self.product_url(product_id))
            .send()
            .await?;
        Self::check(response, product_id)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let response = self
            .client
            .get(format!("{}/products", self.base_url))
            .send()
            .await?;
        Ok(Self::check(response, "")?.json().await?)
    }

    async fn log_bid(&self, entry: &BidLogEntry) -> Result<(), StoreError> {
        let response = self
            .client
            .post(format!("{}/productBids", self.base_url))
            .json(entry)
            .send()
            .await?;
        Self::check(response, &entry.product_id)?;
        Ok(())
    }
}

// endregion: --- HTTP Record Store
