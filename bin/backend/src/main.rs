//! Auction Backend Binary
//!
//! Live auction coordination over WebSocket with PostgreSQL persistence.
//! Runs on BIND_ADDR (e.g. 0.0.0.0:8888).

#[tokio::main]
async fn main() {
    asta_core::log();
    asta_core::kys();
    asta_server::run().await.unwrap();
}
