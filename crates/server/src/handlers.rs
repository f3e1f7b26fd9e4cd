use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use asta_core::LeagueKey;
use asta_hosting::Lobby;

/// Upgrades the request to a WebSocket and hands the session to the league
/// bridge. The path segment is normalized into the league key, so casing
/// and stray whitespace land in the same auction room.
pub async fn enter(
    lobby: web::Data<Lobby>,
    path: web::Path<String>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let league = LeagueKey::from(path.into_inner());
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            match lobby.into_inner().bridge(league, session, stream).await {
                Ok(()) => response.map_into_left_body(),
                Err(e) => HttpResponse::InternalServerError()
                    .body(e.to_string())
                    .map_into_right_body(),
            }
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
