// region:    --- Imports
use thiserror::Error;

use crate::auction::state::AuctionState;
use crate::bidding::model::{Auction, Bid};

// endregion: --- Imports

// region:    --- Reject Reasons

/// Why a candidate bid was refused. The wire codes are stable and shown
/// to the submitting client.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("bid amount must be higher than the current price")]
    AmountNotHigher,

    #[error("auction is not active")]
    AuctionNotActive,

    #[error("required bid fields are missing")]
    MissingFields,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::AmountNotHigher => "amount-not-higher",
            RejectReason::AuctionNotActive => "auction-not-active",
            RejectReason::MissingFields => "missing-fields",
        }
    }
}

// endregion: --- Reject Reasons

// region:    --- Validator

/// Decide whether a candidate bid is acceptable against an auction
/// snapshot. Pure and deterministic; rules are checked in a fixed order
/// so the client always sees the same reason for the same snapshot.
pub fn validate(
    auction: &Auction,
    state: AuctionState,
    candidate: &Bid,
) -> Result<(), RejectReason> {
    if !candidate.amount.is_finite()
        || candidate.amount <= 0.0
        || candidate.amount <= auction.current_price
    {
        return Err(RejectReason::AmountNotHigher);
    }
    if state != AuctionState::Active {
        return Err(RejectReason::AuctionNotActive);
    }
    if candidate.user_id.trim().is_empty() {
        return Err(RejectReason::MissingFields);
    }
    Ok(())
}

// endregion: --- Validator

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn auction(current_price: f64) -> Auction {
        Auction {
            start_time: Utc::now(),
            end_time: None,
            current_price,
            bids: vec![],
            winner_id: None,
        }
    }

    fn bid(user: &str, amount: f64) -> Bid {
        Bid {
            user_id: user.into(),
            username: user.into(),
            amount,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn accepts_a_higher_bid_on_an_active_auction() {
        assert_eq!(
            validate(&auction(100.0), AuctionState::Active, &bid("u1", 150.0)),
            Ok(())
        );
    }

    #[test]
    fn rejects_amounts_at_or_below_the_current_price() {
        let a = auction(100.0);
        for amount in [100.0, 99.9, 0.0, -5.0] {
            assert_eq!(
                validate(&a, AuctionState::Active, &bid("u1", amount)),
                Err(RejectReason::AmountNotHigher)
            );
        }
    }

    #[test]
    fn rejects_non_finite_amounts() {
        let a = auction(100.0);
        for amount in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                validate(&a, AuctionState::Active, &bid("u1", amount)),
                Err(RejectReason::AmountNotHigher)
            );
        }
    }

    #[test]
    fn rejects_bids_on_inactive_auctions() {
        let a = auction(100.0);
        assert_eq!(
            validate(&a, AuctionState::Future, &bid("u1", 150.0)),
            Err(RejectReason::AuctionNotActive)
        );
        assert_eq!(
            validate(&a, AuctionState::Past, &bid("u1", 150.0)),
            Err(RejectReason::AuctionNotActive)
        );
    }

    #[test]
    fn rejects_blank_user_ids() {
        assert_eq!(
            validate(&auction(100.0), AuctionState::Active, &bid("  ", 150.0)),
            Err(RejectReason::MissingFields)
        );
    }

    #[test]
    fn amount_rule_is_checked_before_state() {
        // A low bid on an ended auction reports the amount problem, per
        // the fixed rule order.
        assert_eq!(
            validate(&auction(100.0), AuctionState::Past, &bid("u1", 50.0)),
            Err(RejectReason::AmountNotHigher)
        );
    }
}
