use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auction::state::AuctionState;

/// A single price offer on an auction.
///
/// `username` is denormalized for display; `timestamp` is assigned by the
/// accepting side when the client did not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub user_id: String,
    pub username: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// The bidding sub-record of a Product.
///
/// `bids` is append-only in acceptance order; `current_price` always
/// equals the last accepted amount (or the product's base price while
/// `bids` is empty); `winner_id` is provisional until the auction closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub current_price: f64,
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub winner_id: Option<String>,
}

/// Auction duration as entered by the seller, converted to a seconds
/// offset from `start_time` to derive the end of the auction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDuration {
    #[serde(default)]
    pub years: u32,
    #[serde(default)]
    pub months: u32,
    #[serde(default)]
    pub weeks: u32,
    #[serde(default)]
    pub hours: u32,
}

impl ProductDuration {
    pub fn as_seconds(&self) -> i64 {
        i64::from(self.years) * 31_536_000
            + i64::from(self.months) * 2_592_000
            + i64::from(self.weeks) * 604_800
            + i64::from(self.hours) * 3600
    }
}

/// A Product record as held by the record store. Display metadata
/// (`title`, `description`, `image`) is carried through untouched; the
/// bidding core only interprets `state`, `duration` and `auction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub base_price: f64,
    #[serde(default)]
    pub duration: ProductDuration,
    #[serde(default)]
    pub state: Option<AuctionState>,
    pub auction: Auction,
    /// Fields owned by other services sharing the record (chat threads,
    /// visit counters). Writes are full replaces, so anything not modeled
    /// here must survive the round trip untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Audit entry appended to the bid-history log, decoupled from the live
/// Product record. `bid_id` reuses the bid timestamp, as the original
/// history collection did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidLogEntry {
    pub user_id: String,
    pub product_id: String,
    pub bid_id: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}
