//! WebSocket auction hosting infrastructure.
//!
//! Server-side machinery for running live auctions over WebSocket
//! connections: per-league broadcast groups, session lifecycles, and the
//! frame loop wiring sockets to the auction engine.
//!
//! ## Core Types
//!
//! - [`Lobby`] — registry of per-league broadcast groups
//! - [`Session`] — marker for connection identities
//!
//! The bridge submodule hangs the WebSocket session loop off [`Lobby`]:
//! inbound frames dispatch into [`asta_auction::Auctioneer`] and outcomes
//! fan out to the caller, the moderator sub-group, or the whole league.
mod bridge;
mod lobby;

pub use lobby::*;
