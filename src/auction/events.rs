use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bidding::model::{Auction, Bid};

/// Events pushed to live subscribers. The `type` tag and camelCase field
/// names match what the original viewers parse off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LiveEvent {
    /// Acknowledgment frame queued the moment a subscriber registers, so
    /// the connection is confirmed live before any auction events arrive.
    Connected,
    /// Snapshot of the auction sent once on connect to a per-product
    /// stream.
    Init { auction: Auction },
    /// An accepted bid.
    NewBid {
        product_id: String,
        user_id: String,
        username: String,
        amount: f64,
        timestamp: DateTime<Utc>,
    },
}

impl LiveEvent {
    pub fn new_bid(product_id: &str, bid: &Bid) -> Self {
        LiveEvent::NewBid {
            product_id: product_id.to_string(),
            user_id: bid.user_id.clone(),
            username: bid.username.clone(),
            amount: bid.amount,
            timestamp: bid.timestamp,
        }
    }

    /// SSE event name for this payload.
    pub fn event_name(&self) -> &'static str {
        match self {
            LiveEvent::Connected => "connected",
            LiveEvent::Init { .. } => "init",
            LiveEvent::NewBid { .. } => "new_bid",
        }
    }

    /// The product this event concerns, if any. `Connected` is
    /// subscriber-local and carries no product.
    pub fn product_id(&self) -> Option<&str> {
        match self {
            LiveEvent::Connected => None,
            LiveEvent::Init { .. } => None,
            LiveEvent::NewBid { product_id, .. } => Some(product_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bid_serializes_with_type_tag_and_camel_case() {
        let bid = Bid {
            user_id: "u1".into(),
            username: "ana".into(),
            amount: 150.0,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(LiveEvent::new_bid("p1", &bid)).unwrap();
        assert_eq!(value["type"], "new_bid");
        assert_eq!(value["productId"], "p1");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["username"], "ana");
        assert_eq!(value["amount"], 150.0);
    }
}
