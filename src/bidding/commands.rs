// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auction::events::LiveEvent;
use crate::auction::state;
use crate::bidding::model::{Auction, Bid, BidLogEntry};
use crate::bidding::validator;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::RecordStore;

// endregion: --- Imports

// region:    --- Commands

/// Bid submission as received at the boundary. `timestamp` is optional;
/// the accepting side stamps the current time when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub product_id: String,
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    pub amount: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Accept a bid against the product's auction and persist the result.
///
/// Runs the whole read-validate-write sequence inside the product's
/// critical section so two submissions racing on the same current price
/// cannot both validate against a stale snapshot. The record store
/// read and write are the only suspension points under the lock.
pub async fn handle_place_bid(
    app: &AppState,
    cmd: PlaceBidCommand,
) -> Result<(Bid, Auction), AppError> {
    info!(
        "{:<12} --> bid of {} by {} on product {}",
        "Command", cmd.amount, cmd.user_id, cmd.product_id
    );
    let _guard = app.locks.acquire(&cmd.product_id).await?;

    let mut product = app.store.get(&cmd.product_id).await?;
    let now = Utc::now();

    // Central lazy transition: a just-started or just-expired auction is
    // moved forward (winner finalized on close) before validation, and
    // the transition is persisted even when the bid is then rejected.
    if state::apply_transition(&mut product, now) {
        product = app.store.put(&product).await?;
    }
    let resolved = state::resolve(&product, now);

    let candidate = Bid {
        user_id: cmd.user_id,
        username: cmd.username,
        amount: cmd.amount,
        timestamp: cmd.timestamp.unwrap_or(now),
    };
    validator::validate(&product.auction, resolved, &candidate)?;

    // Full replace of the post-bid state; the provisional winner is the
    // latest bidder until the auction closes.
    product.auction.bids.push(candidate.clone());
    product.auction.current_price = candidate.amount;
    product.auction.winner_id = Some(candidate.user_id.clone());
    let stored = app.store.put(&product).await?;

    app.store
        .log_bid(&BidLogEntry {
            user_id: candidate.user_id.clone(),
            product_id: stored.id.clone(),
            bid_id: candidate.timestamp,
            timestamp: candidate.timestamp,
        })
        .await?;

    info!(
        "{:<12} --> bid accepted, product {} now at {}",
        "Command", stored.id, stored.auction.current_price
    );
    Ok((candidate, stored.auction))
}

/// Boundary composition: persist the bid, then fan it out to live
/// subscribers. Broadcast strictly follows a successful persist; a bid
/// that failed to persist is never announced.
pub async fn place_bid_and_publish(
    app: &AppState,
    cmd: PlaceBidCommand,
) -> Result<(Bid, Auction), AppError> {
    let product_id = cmd.product_id.clone();
    let (bid, auction) = handle_place_bid(app, cmd).await?;
    app.broadcaster.publish(&LiveEvent::new_bid(&product_id, &bid));
    Ok((bid, auction))
}

/// Administrative close: stamps `end_time = now`, finalizes the winner
/// and persists the closed record.
pub async fn handle_close_auction(app: &AppState, product_id: &str) -> Result<Auction, AppError> {
    info!("{:<12} --> closing auction {}", "Command", product_id);
    let _guard = app.locks.acquire(product_id).await?;

    let mut product = app.store.get(product_id).await?;
    state::close(&mut product, Utc::now());
    let stored = app.store.put(&product).await?;
    Ok(stored.auction)
}

// endregion: --- Commands
