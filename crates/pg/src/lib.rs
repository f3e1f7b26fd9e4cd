//! PostgreSQL persistence collaborator for the auction engine.
//!
//! The engine never talks SQL directly: it settles through the
//! [`asta_auction::RosterGateway`] and [`asta_auction::SummaryGateway`]
//! seams, and this crate provides their production implementations.
//!
//! ## Connectivity
//!
//! - [`db()`] — establishes a database connection from `DATABASE_URL`
//!
//! ## Gateways
//!
//! - [`PgRoster`] — roster/catalog existence checks, inserts, and the
//!   goalkeeper-block cascade source query
//! - [`PgSummary`] — league-wide budget recap (credits left, max bid)
mod roster;
mod summary;

pub use roster::*;
pub use summary::*;

use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes a database connection.
///
/// Connects to PostgreSQL using the `DATABASE_URL` environment variable and
/// returns an `Arc<Client>` suitable for sharing across async tasks.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is not set or if connection fails; there is no
/// degraded mode without persistence.
pub async fn db() -> Arc<Client> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(connection);
    Arc::new(client)
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table of leagues (alias is the normalized key used everywhere).
#[rustfmt::skip]
pub const LEAGUES: &str = "leagues";
/// Table of squads (one per participant nickname per league).
#[rustfmt::skip]
pub const SQUADS:  &str = "squads";
/// Table of purchased players per squad.
#[rustfmt::skip]
pub const ROSTERS: &str = "rosters";
/// Table of the imported player catalog, scoped per league.
#[rustfmt::skip]
pub const CATALOG: &str = "catalog";

/// Creates the tables this crate queries, if missing. Idempotent.
pub async fn ensure_schema(client: &Client) -> Result<(), PgErr> {
    client
        .batch_execute(const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            LEAGUES,
            " (
                id      UUID PRIMARY KEY,
                alias   TEXT NOT NULL UNIQUE,
                slots   SMALLINT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS ",
            SQUADS,
            " (
                id        UUID PRIMARY KEY,
                league_id UUID NOT NULL REFERENCES ",
            LEAGUES,
            "(id) ON DELETE CASCADE,
                nickname  TEXT NOT NULL,
                credits   INTEGER NOT NULL,
                UNIQUE (league_id, nickname)
            );
            CREATE TABLE IF NOT EXISTS ",
            CATALOG,
            " (
                league_id UUID NOT NULL REFERENCES ",
            LEAGUES,
            "(id) ON DELETE CASCADE,
                catalog   BIGINT NOT NULL,
                name      TEXT NOT NULL,
                role      TEXT NOT NULL,
                alt_role  TEXT,
                club      TEXT NOT NULL,
                PRIMARY KEY (league_id, catalog)
            );
            CREATE TABLE IF NOT EXISTS ",
            ROSTERS,
            " (
                squad_id  UUID NOT NULL REFERENCES ",
            SQUADS,
            "(id) ON DELETE CASCADE,
                catalog   BIGINT NOT NULL,
                name      TEXT NOT NULL,
                role      TEXT NOT NULL,
                alt_role  TEXT,
                club      TEXT NOT NULL,
                price     INTEGER NOT NULL,
                PRIMARY KEY (squad_id, catalog)
            );
            CREATE INDEX IF NOT EXISTS idx_squads_league ON ",
            SQUADS,
            " (league_id);
            CREATE INDEX IF NOT EXISTS idx_catalog_club ON ",
            CATALOG,
            " (league_id, role, club);"
        ))
        .await
}
