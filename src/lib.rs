pub mod auction;
pub mod bidding;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod handlers;
pub mod scheduler;
pub mod state;
pub mod store;
