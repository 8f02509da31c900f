// region:    --- Imports
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

use crate::auction::state;
use crate::error::StoreError;
use crate::state::AppState;
use crate::store::RecordStore;

// endregion: --- Imports

// region:    --- Auction Sweeper

/// Background task that re-resolves every auction's lifecycle on a fixed
/// interval and persists the transitions, so clients polling the record
/// store directly also observe started and closed auctions without going
/// through a read endpoint.
pub struct AuctionSweeper {
    app: Arc<AppState>,
    sweep_interval: Duration,
}

impl AuctionSweeper {
    pub fn new(app: Arc<AppState>, sweep_interval: Duration) -> Self {
        Self {
            app,
            sweep_interval,
        }
    }

    pub fn start(self) {
        tokio::spawn(async move {
            let mut ticker = interval(self.sweep_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = Self::sweep(&self.app).await {
                    error!("{:<12} --> sweep failed: {:?}", "Sweeper", e);
                }
            }
        });
    }

    async fn sweep(app: &AppState) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut transitions = 0;
        for listed in app.store.list().await? {
            // Same critical section as the ledger: the transition write
            // is a full replace and must not overwrite a bid landing on
            // the product right now. A contended product is left for the
            // next tick.
            let Ok(_guard) = app.locks.acquire(&listed.id).await else {
                continue;
            };
            // Re-read under the lock; the listing may be stale.
            let mut product = match app.store.get(&listed.id).await {
                Ok(product) => product,
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            if state::apply_transition(&mut product, now) {
                app.store.put(&product).await?;
                transitions += 1;
            }
        }
        if transitions > 0 {
            debug!(
                "{:<12} --> persisted {} state transition(s)",
                "Sweeper", transitions
            );
        }
        Ok(())
    }
}

// endregion: --- Auction Sweeper

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::state::AuctionState;
    use crate::bidding::model::{Auction, Bid, Product, ProductDuration};
    use crate::config::Config;
    use crate::store::MemoryRecordStore;
    use chrono::Duration as ChronoDuration;

    fn test_config() -> Config {
        Config {
            port: 0,
            store_url: String::new(),
            lock_timeout_ms: 50,
            sweep_interval_secs: 1,
        }
    }

    fn expired_product(id: &str) -> Product {
        Product {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            image: String::new(),
            base_price: 50.0,
            duration: ProductDuration {
                hours: 1,
                ..Default::default()
            },
            state: Some(AuctionState::Active),
            auction: Auction {
                start_time: Utc::now() - ChronoDuration::hours(2),
                end_time: None,
                current_price: 120.0,
                bids: vec![Bid {
                    user_id: "B".into(),
                    username: "B".into(),
                    amount: 120.0,
                    timestamp: Utc::now() - ChronoDuration::hours(1),
                }],
                winner_id: Some("B".into()),
            },
            extra: Default::default(),
        }
    }

    async fn app_with(product: &Product) -> (Arc<AppState>, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::new());
        store.create(product).await.unwrap();
        (AppState::new(test_config(), store.clone()), store)
    }

    #[tokio::test]
    async fn sweep_closes_expired_auctions_and_finalizes_winners() {
        let (app, store) = app_with(&expired_product("p1")).await;

        AuctionSweeper::sweep(&app).await.unwrap();

        let stored = store.get("p1").await.unwrap();
        assert_eq!(stored.state, Some(AuctionState::Past));
        assert_eq!(stored.auction.winner_id.as_deref(), Some("B"));
        assert!(stored.auction.end_time.is_some());
    }

    #[tokio::test]
    async fn sweep_leaves_settled_records_alone() {
        let mut product = expired_product("p1");
        product.state = Some(AuctionState::Past);
        product.auction.end_time = Some(Utc::now());
        let (app, store) = app_with(&product).await;

        AuctionSweeper::sweep(&app).await.unwrap();
        assert_eq!(store.get("p1").await.unwrap(), product);
    }

    #[tokio::test]
    async fn sweep_defers_products_held_by_an_in_flight_submission() {
        let (app, store) = app_with(&expired_product("p1")).await;

        let guard = app.locks.acquire("p1").await.unwrap();
        AuctionSweeper::sweep(&app).await.unwrap();
        assert_eq!(
            store.get("p1").await.unwrap().state,
            Some(AuctionState::Active)
        );

        drop(guard);
        AuctionSweeper::sweep(&app).await.unwrap();
        assert_eq!(
            store.get("p1").await.unwrap().state,
            Some(AuctionState::Past)
        );
    }
}
