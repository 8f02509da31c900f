// region:    --- Imports
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bidding::model::{Bid, Product};

// endregion: --- Imports

// region:    --- Auction State

/// Lifecycle of an auction. Transitions only move forward:
/// `future -> active -> past`; `past` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionState {
    Future,
    Active,
    Past,
}

/// When the auction ends: the stamped `end_time` if one exists (set by an
/// administrative close), otherwise `start_time` plus the product's
/// duration.
pub fn end_time(product: &Product) -> DateTime<Utc> {
    product.auction.end_time.unwrap_or_else(|| {
        product.auction.start_time + Duration::seconds(product.duration.as_seconds())
    })
}

/// Resolve the state the auction is in at `now`.
///
/// Computed centrally on every read so all clients agree, instead of each
/// viewer deriving it from the clock. A record already marked `past`
/// never reopens, and a record marked `active` never falls back to
/// `future`, regardless of what the timestamps say.
pub fn resolve(product: &Product, now: DateTime<Utc>) -> AuctionState {
    match product.state {
        Some(AuctionState::Past) => AuctionState::Past,
        stored => {
            let computed = if now < product.auction.start_time {
                AuctionState::Future
            } else if now >= end_time(product) {
                AuctionState::Past
            } else {
                AuctionState::Active
            };
            match (stored, computed) {
                (Some(AuctionState::Active), AuctionState::Future) => AuctionState::Active,
                _ => computed,
            }
        }
    }
}

/// Apply the time-driven transition to the record, returning whether
/// anything changed. On entry to `past` the winner is finalized and the
/// computed end time is stamped if the record had none.
pub fn apply_transition(product: &mut Product, now: DateTime<Utc>) -> bool {
    let resolved = resolve(product, now);
    if product.state == Some(resolved) {
        return false;
    }
    if resolved == AuctionState::Past {
        let ended_at = end_time(product);
        finalize(product, ended_at);
    }
    product.state = Some(resolved);
    info!(
        "{:<12} --> auction {} is now {:?}",
        "State", product.id, resolved
    );
    true
}

/// Administrative close: stamps `end_time = now`, marks the auction
/// `past` and finalizes the winner.
pub fn close(product: &mut Product, now: DateTime<Utc>) {
    finalize(product, now);
    product.state = Some(AuctionState::Past);
    info!("{:<12} --> auction {} closed", "State", product.id);
}

fn finalize(product: &mut Product, ended_at: DateTime<Utc>) {
    product.auction.end_time = Some(ended_at);
    product.auction.winner_id = winning_bid(&product.auction.bids).map(|b| b.user_id.clone());
}

/// The bid that wins the auction: highest amount, ties broken by the
/// earliest timestamp, then by acceptance order.
pub fn winning_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().fold(None, |best: Option<&Bid>, bid| match best {
        Some(b) if bid.amount > b.amount || (bid.amount == b.amount && bid.timestamp < b.timestamp) => {
            Some(bid)
        }
        Some(b) => Some(b),
        None => Some(bid),
    })
}

// endregion: --- Auction State
