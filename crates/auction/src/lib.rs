//! Per-league live auction coordination.
//!
//! This crate is the concurrency core: many participants submit competing
//! bids or buzz claims within milliseconds, and every league must settle
//! each lot exactly once. All mutation is serialized through one lock per
//! league; leagues never contend with each other.
//!
//! ## Architecture
//!
//! - [`AuctionStore`] — keyed table of per-league state, one mutex per key
//! - [`AuctionState`] — the state machine: bidding, buzzer, pause, latch
//! - [`Auctioneer`] — facade consumed by the hosting layer, one method per
//!   inbound action
//! - [`Settler`] — idempotent award path behind the [`RosterGateway`] seam
//!
//! ## Supporting pieces
//!
//! - [`PresenceTracker`] — per-league liveness and ready flags
//! - [`RateLimiter`] — per-league buzz/bid cooldown windows
//! - [`Clock`] — wall-clock seam so countdowns are testable
//! - [`ClientMessage`]/[`ServerMessage`] — the WebSocket wire format
mod bidding;
mod buzzer;
mod clock;
mod coordinator;
mod limiter;
mod message;
mod pause;
mod presence;
mod settlement;
mod state;
mod store;

pub use bidding::*;
pub use buzzer::*;
pub use clock::*;
pub use coordinator::*;
pub use limiter::*;
pub use message::*;
pub use pause::*;
pub use presence::*;
pub use settlement::*;
pub use state::*;
pub use store::*;
