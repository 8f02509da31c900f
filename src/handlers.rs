// region:    --- Imports
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::auction::events::LiveEvent;
use crate::auction::state;
use crate::bidding::commands::{self, PlaceBidCommand};
use crate::bidding::model::{Bid, Product};
use crate::bidding::validator::RejectReason;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::RecordStore;

// endregion: --- Imports

// region:    --- Command Handlers

/// Bid submission endpoint. The typed body is checked for presence at
/// the boundary, the ledger persists the bid, and only then is it fanned
/// out to live subscribers.
pub async fn handle_bid(
    State(app): State<Arc<AppState>>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, AppError> {
    info!(
        "{:<12} --> bid request on product {}",
        "Handler", cmd.product_id
    );
    if cmd.product_id.trim().is_empty() || cmd.user_id.trim().is_empty() {
        return Err(AppError::Rejected(RejectReason::MissingFields));
    }

    let (bid, _) = commands::place_bid_and_publish(&app, cmd).await?;
    Ok((StatusCode::OK, Json(json!({ "sent": true, "bid": bid }))))
}

/// Administrative close of an auction.
pub async fn handle_close_auction(
    State(app): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    info!("{:<12} --> close request for {}", "Handler", product_id);
    let auction = commands::handle_close_auction(&app, &product_id).await?;
    Ok(Json(auction))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// Load a product and run the central lazy state transition, persisting
/// it when it fires, so every reader observes the same lifecycle.
///
/// Runs under the product's critical section: the transition write is a
/// full replace, and an unlocked read racing a bid submission could put
/// its stale snapshot back over the accepted bid.
async fn read_resolved(app: &AppState, product_id: &str) -> Result<Product, AppError> {
    let _guard = app.locks.acquire(product_id).await?;
    let mut product = app.store.get(product_id).await?;
    if state::apply_transition(&mut product, Utc::now()) {
        product = app.store.put(&product).await?;
    }
    Ok(product)
}

/// Resolved auction state of a product.
pub async fn handle_get_auction(
    State(app): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, AppError> {
    info!("{:<12} --> auction state of {}", "Handler", product_id);
    Ok(Json(read_resolved(&app, &product_id).await?))
}

/// Bid history of a product, in acceptance order.
pub async fn handle_get_bid_history(
    State(app): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Bid>>, AppError> {
    info!("{:<12} --> bid history of {}", "Handler", product_id);
    let product = read_resolved(&app, &product_id).await?;
    Ok(Json(product.auction.bids))
}

// endregion: --- Query Handlers

// region:    --- Subscription Handlers

fn to_sse_event(event: LiveEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.event_name()).json_data(&event)
}

/// Long-lived push stream over all auctions. Subscribers filtering
/// client-side get the `connected` ack first, then every accepted bid in
/// publish order.
pub async fn handle_events(
    State(app): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("{:<12} --> new global subscriber", "Handler");
    let subscription = app.broadcaster.subscribe(None);
    Sse::new(subscription.map(to_sse_event)).keep_alive(KeepAlive::default())
}

/// Push stream scoped to one product: `connected` ack, an `init`
/// snapshot of the auction, then its accepted bids. Dropping the
/// connection deregisters the subscriber.
pub async fn handle_product_events(
    State(app): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    info!("{:<12} --> new subscriber for {}", "Handler", product_id);

    // Register before reading the snapshot: a bid accepted while the
    // read is in flight then shows up in the stream (and possibly also
    // in the snapshot, which viewers reconcile) instead of in neither.
    let subscription = app.broadcaster.subscribe(Some(product_id.clone()));
    let product = read_resolved(&app, &product_id).await?;
    subscription.push(LiveEvent::Init {
        auction: product.auction,
    });
    Ok(Sse::new(subscription.map(to_sse_event)).keep_alive(KeepAlive::default()))
}

// endregion: --- Subscription Handlers
