use super::*;
use asta_auction::ClientMessage;
use asta_auction::Outcome;
use asta_auction::ReadyKind;
use asta_auction::ServerMessage;
use asta_auction::decode;
use asta_core::ID;
use asta_core::LeagueKey;
use std::sync::Arc;

/// WebSocket bridging: one spawned task per socket, pumping outbound frames
/// from the league group and inbound frames into the auctioneer.
impl Lobby {
    /// Takes over an upgraded WebSocket. Joins the league group, confirms
    /// the connection, and spawns the session loop; returns once the socket
    /// is wired up.
    pub async fn bridge(
        self: &Arc<Self>,
        league: LeagueKey,
        mut session: actix_ws::Session,
        mut frames: actix_ws::MessageStream,
    ) -> anyhow::Result<()> {
        use futures::StreamExt;
        let (id, mut rx) = self.join(&league).await;
        session
            .text(ServerMessage::connected(league.as_str()).to_json())
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        log::debug!("[bridge {}] session {} connected", league, id);
        let lobby = self.clone();
        actix_web::rt::spawn(async move {
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(json) => if session.text(json).await.is_err() { break 'sesh },
                        None => break 'sesh,
                    },
                    msg = frames.next() => match msg {
                        Some(Ok(actix_ws::Message::Text(text))) => lobby.dispatch(&league, id, &text).await,
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            lobby.leave(&league, id).await;
            log::debug!("[bridge {}] session {} disconnected", league, id);
        });
        Ok(())
    }

    /// Routes one inbound frame to the auctioneer and fans the outcome out.
    /// Malformed frames are dropped; settlement failures are logged and
    /// nothing is broadcast, leaving the league latched for an operator.
    pub(crate) async fn dispatch(&self, league: &LeagueKey, id: ID<Session>, frame: &str) {
        let message = match decode(frame) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("[bridge {}] dropping malformed frame: {}", league, e);
                return;
            }
        };
        let auctioneer = self.auctioneer();
        let outcome = match message {
            ClientMessage::Register { nick, is_admin } => {
                if is_admin {
                    self.promote(league, id).await;
                }
                auctioneer.register(league, &nick, is_admin).await
            }
            ClientMessage::Heartbeat { nick } => {
                auctioneer.heartbeat(league, &nick).await;
                return;
            }
            ClientMessage::MarkReady { nick, kind } => {
                let kind = match kind.as_str() {
                    "start" => ReadyKind::Start,
                    "resume" => ReadyKind::Resume,
                    other => {
                        log::debug!("[bridge {}] unknown ready kind: {}", league, other);
                        return;
                    }
                };
                auctioneer.mark_ready(league, &nick, kind).await
            }
            ClientMessage::StartAuction { lot, alt_role_mode } => {
                auctioneer.start_auction(league, lot, alt_role_mode).await
            }
            ClientMessage::SubmitBid { bidder, amount, expected } => {
                auctioneer.submit_bid(league, &bidder, amount, expected).await
            }
            ClientMessage::Buzz { claimant } => auctioneer.buzz(league, &claimant).await,
            ClientMessage::Pause => auctioneer.pause(league).await,
            ClientMessage::Resume => auctioneer.resume(league).await,
            ClientMessage::CancelAuction => auctioneer.cancel(league).await,
            ClientMessage::SetTimer { secs } => auctioneer.set_timer(league, secs).await,
            ClientMessage::SetBuzzerMode { on } => auctioneer.set_buzzer_mode(league, on).await,
            ClientMessage::SetGoalkeeperBlock { on } => {
                auctioneer.set_goalkeeper_block(league, on).await
            }
            ClientMessage::Suggest { nick, player } => {
                self.broadcast_admins(league, &ServerMessage::PlayerSuggested { nick, player })
                    .await;
                return;
            }
            ClientMessage::RequestState => auctioneer.request_state(league).await,
            ClientMessage::RequestFinalize => match auctioneer.finalize(league).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("[bridge {}] settlement failed: {:#}", league, e);
                    return;
                }
            },
            ClientMessage::Assign { price } => match auctioneer.assign_price(league, price).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("[bridge {}] price settlement failed: {:#}", league, e);
                    return;
                }
            },
        };
        self.deliver(league, id, outcome).await;
    }

    /// Maps an engine outcome onto the wire. Throttle hints and state
    /// replays go to the caller alone; price requests go to the moderator
    /// sub-group; everything else is league-wide.
    async fn deliver(&self, league: &LeagueKey, id: ID<Session>, outcome: Outcome) {
        match outcome {
            Outcome::Started(snapshot) => {
                if let Some(lot) = snapshot.lot {
                    let alt_role_mode = snapshot.alt_role_mode;
                    self.broadcast(league, &ServerMessage::LotStarted { lot, alt_role_mode })
                        .await;
                }
            }
            Outcome::Bid { bidder, amount, deadline_ms } => {
                self.broadcast(league, &ServerMessage::BidUpdated { bidder, amount, deadline_ms })
                    .await
            }
            Outcome::Buzz { claimant, deadline_ms } => {
                self.broadcast(league, &ServerMessage::BuzzAccepted { claimant, deadline_ms })
                    .await
            }
            Outcome::Paused {
                elapsed_secs,
                remaining_secs,
                presence,
            } => {
                self.broadcast(
                    league,
                    &ServerMessage::AuctionPaused {
                        elapsed_secs,
                        remaining_secs,
                        presence,
                    },
                )
                .await
            }
            Outcome::Resumed { deadline_ms, presence } => {
                self.broadcast(league, &ServerMessage::AuctionResumed { deadline_ms, presence })
                    .await
            }
            Outcome::Cancelled | Outcome::Voided => {
                self.broadcast(league, &ServerMessage::AuctionCancelled).await
            }
            Outcome::Settled { settled, summary } => {
                self.broadcast(league, &ServerMessage::settled(settled)).await;
                self.broadcast(league, &ServerMessage::SummaryUpdated { summary })
                    .await;
            }
            Outcome::PriceRequested { lot, claimant } => {
                self.broadcast_admins(league, &ServerMessage::PriceRequested { lot, claimant })
                    .await
            }
            Outcome::RateLimited(wait) => {
                self.send(league, id, &ServerMessage::RateLimited { retry_after_ms: wait.millis })
                    .await
            }
            Outcome::TimerSet(secs) => {
                self.broadcast(league, &ServerMessage::TimerUpdated { secs }).await
            }
            Outcome::BuzzerModeSet(on) => {
                self.broadcast(league, &ServerMessage::BuzzerModeUpdated { on }).await
            }
            Outcome::GoalkeeperBlockSet(on) => {
                self.broadcast(league, &ServerMessage::GoalkeeperBlockUpdated { on })
                    .await
            }
            Outcome::Presence(entries) => {
                self.broadcast(league, &ServerMessage::presence(entries)).await
            }
            Outcome::State(state) => self.send(league, id, &ServerMessage::State { state }).await,
            Outcome::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::tests::lobby;

    fn start_frame() -> &'static str {
        r#"{"type":"start_auction","lot":{"catalog":9,"name":"Vidal","role":"C","club":"Como"}}"#
    }

    #[tokio::test]
    async fn start_frame_broadcasts_lot_to_league() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (caller, mut rx_caller) = lobby.join(&league).await;
        let (_, mut rx_other) = lobby.join(&league).await;
        lobby.dispatch(&league, caller, start_frame()).await;
        for rx in [&mut rx_caller, &mut rx_other] {
            let json = rx.try_recv().unwrap();
            assert!(json.contains(r#""type":"lot_started""#));
            assert!(json.contains("Vidal"));
        }
    }

    #[tokio::test]
    async fn throttled_bid_answers_caller_only() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (caller, mut rx_caller) = lobby.join(&league).await;
        let (_, mut rx_other) = lobby.join(&league).await;
        lobby.dispatch(&league, caller, start_frame()).await;
        lobby
            .dispatch(&league, caller, r#"{"type":"submit_bid","bidder":"ada","amount":5}"#)
            .await;
        lobby
            .dispatch(&league, caller, r#"{"type":"submit_bid","bidder":"bob","amount":6}"#)
            .await;
        // caller: lot_started, bid_updated, rate_limited
        let frames: Vec<String> = std::iter::from_fn(|| rx_caller.try_recv().ok()).collect();
        assert_eq!(frames.len(), 3);
        assert!(frames[2].contains(r#""type":"rate_limited""#));
        // the group never sees the throttle hint
        let frames: Vec<String> = std::iter::from_fn(|| rx_other.try_recv().ok()).collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains(r#""type":"bid_updated""#));
    }

    #[tokio::test]
    async fn state_replay_targets_caller_only() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (caller, mut rx_caller) = lobby.join(&league).await;
        let (_, mut rx_other) = lobby.join(&league).await;
        lobby.dispatch(&league, caller, r#"{"type":"request_state"}"#).await;
        assert!(rx_caller.try_recv().unwrap().contains(r#""type":"state""#));
        assert!(rx_other.try_recv().is_err());
    }

    #[tokio::test]
    async fn registering_admin_joins_moderator_group() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (admin, mut rx_admin) = lobby.join(&league).await;
        lobby
            .dispatch(&league, admin, r#"{"type":"register","nick":"mod","is_admin":true}"#)
            .await;
        assert!(rx_admin.try_recv().unwrap().contains(r#""type":"presence""#));
        lobby
            .broadcast_admins(&league, &ServerMessage::AuctionCancelled)
            .await;
        assert!(rx_admin.try_recv().is_ok());
    }

    #[tokio::test]
    async fn buzzer_mode_frame_enables_buzzing() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (caller, mut rx) = lobby.join(&league).await;
        lobby
            .dispatch(&league, caller, r#"{"type":"set_buzzer_mode","on":true}"#)
            .await;
        lobby.dispatch(&league, caller, start_frame()).await;
        lobby.dispatch(&league, caller, r#"{"type":"buzz","claimant":"ada"}"#).await;
        let frames: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(frames[0].contains(r#""type":"buzzer_mode_updated""#));
        assert!(frames[2].contains(r#""type":"buzz_accepted""#));
    }

    #[tokio::test]
    async fn goalkeeper_block_toggle_is_broadcast() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (caller, _rx) = lobby.join(&league).await;
        let (_, mut rx_other) = lobby.join(&league).await;
        lobby
            .dispatch(&league, caller, r#"{"type":"set_goalkeeper_block","on":false}"#)
            .await;
        let json = rx_other.try_recv().unwrap();
        assert!(json.contains(r#""type":"goalkeeper_block_updated""#));
        assert!(json.contains(r#""on":false"#));
    }

    #[tokio::test]
    async fn suggestions_reach_moderators_only() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (admin, mut rx_admin) = lobby.join(&league).await;
        let (caller, mut rx_caller) = lobby.join(&league).await;
        lobby.promote(&league, admin).await;
        lobby
            .dispatch(
                &league,
                caller,
                r#"{"type":"suggest","nick":"ada","player":"Rossi"}"#,
            )
            .await;
        let json = rx_admin.try_recv().unwrap();
        assert!(json.contains(r#""type":"player_suggested""#));
        assert!(json.contains("Rossi"));
        assert!(rx_caller.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped() {
        let lobby = Arc::new(lobby());
        let league = LeagueKey::from("alpha");
        let (caller, mut rx) = lobby.join(&league).await;
        lobby.dispatch(&league, caller, "not json").await;
        lobby.dispatch(&league, caller, r#"{"type":"mark_ready","nick":"ada","kind":"??"}"#).await;
        assert!(rx.try_recv().is_err());
    }
}
