// region:    --- Imports
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use live_auction_service::config::Config;
use live_auction_service::handlers;
use live_auction_service::scheduler::AuctionSweeper;
use live_auction_service::state::AppState;
use live_auction_service::store::HttpRecordStore;

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::load();
    let store = Arc::new(HttpRecordStore::new(&config.store_url));
    info!(
        "{:<12} --> record store at {}",
        "Main", config.store_url
    );

    let app_state = AppState::new(config.clone(), store);

    // Background lifecycle sweep, so auctions close even with no reader.
    // Shares the per-product locks so a sweep never overwrites a bid.
    AuctionSweeper::new(
        Arc::clone(&app_state),
        Duration::from_secs(config.sweep_interval_secs),
    )
    .start();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_bid))
        .route("/events", get(handlers::handle_events))
        .route("/bids/:product_id", get(handlers::handle_product_events))
        .route("/auction/:product_id", get(handlers::handle_get_auction))
        .route(
            "/auction/:product_id/bids",
            get(handlers::handle_get_bid_history),
        )
        .route(
            "/auction/:product_id/close",
            post(handlers::handle_close_auction),
        )
        .layer(cors)
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if ctrl_c().await.is_ok() {
            info!("{:<12} --> received Ctrl+C, shutting down", "Main");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("{:<12} --> received terminate signal, shutting down", "Main");
            }
            Err(e) => error!("{:<12} --> signal handler failed: {}", "Main", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
// endregion: --- Main
