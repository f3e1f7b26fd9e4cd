//! Auction Backend Server
//!
//! Wires the auction engine to PostgreSQL persistence and WebSocket
//! hosting behind a single actix-web server.
//!
//! ## Routes
//!
//! - `GET /health` — liveness plus a database round trip
//! - `GET /ws/{league}` — upgrades to the league's auction socket
mod handlers;

pub use handlers::*;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use asta_auction::Auctioneer;
use asta_auction::Clock;
use asta_auction::SystemClock;
use asta_hosting::Lobby;
use std::sync::Arc;
use tokio_postgres::Client;

async fn health(client: web::Data<Arc<Client>>) -> impl Responder {
    match client
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

pub async fn run() -> Result<(), std::io::Error> {
    let client = asta_pg::db().await;
    asta_pg::ensure_schema(&client)
        .await
        .expect("schema migration failed");
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let roster = Arc::new(asta_pg::PgRoster::new(client.clone()));
    let summary = Arc::new(asta_pg::PgSummary::new(client.clone()));
    let auctioneer = Arc::new(Auctioneer::new(clock, roster, summary));
    let lobby = web::Data::new(Lobby::new(auctioneer));
    let client = web::Data::new(client);
    log::info!("starting auction server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(lobby.clone())
            .app_data(client.clone())
            .route("/health", web::get().to(health))
            .route("/ws/{league}", web::get().to(handlers::enter))
    })
    .workers(6)
    .bind(std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"))?
    .run()
    .await
}
