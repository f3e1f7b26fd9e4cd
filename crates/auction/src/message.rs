use super::*;
use asta_core::Credits;
use serde::Deserialize;
use serde::Serialize;

/// Messages sent from client to server over WebSocket. Every action rides
/// on a league-scoped connection; the league key comes from the socket
/// path, the caller identity from the payload nickname.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Joins the presence roster; moderators also join the admin sub-group.
    Register { nick: String, #[serde(default)] is_admin: bool },
    /// Liveness refresh.
    Heartbeat { nick: String },
    /// Ready acknowledgement before first lot or before a resume.
    MarkReady { nick: String, kind: String },
    /// Moderator: puts a lot up for auction.
    StartAuction { lot: Lot, #[serde(default)] alt_role_mode: bool },
    /// Numeric bid; `expected` guards against stale UI state.
    SubmitBid {
        bidder: String,
        amount: Credits,
        #[serde(default)]
        expected: Option<Credits>,
    },
    /// Buzz-in claim.
    Buzz { claimant: String },
    /// Moderator: freeze the countdown.
    Pause,
    /// Moderator: restore the countdown.
    Resume,
    /// Moderator: reset the auction to Idle.
    CancelAuction,
    /// Client believes time is up; the server re-validates.
    RequestFinalize,
    /// Full state replay for reconnect/refresh.
    RequestState,
    /// Moderator: change the countdown length (clamped at the floor).
    SetTimer { secs: u64 },
    /// Moderator: switch the league between numeric and buzz-in bidding.
    SetBuzzerMode { on: bool },
    /// Moderator: toggle the goalkeeper block cascade at settlement.
    SetGoalkeeperBlock { on: bool },
    /// Moderator: price entry completing a buzzer-mode settlement.
    Assign { price: Credits },
    /// Participant: propose a player for the next lot, moderators only.
    Suggest { nick: String, player: String },
}

/// Messages sent from server to client over WebSocket. Deadlines travel as
/// unix epoch milliseconds so clients run the countdown locally; the server
/// remains the sole authority at finalize time.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Initial connection confirmation.
    Connected { league: String },
    /// A new lot is on the block.
    LotStarted { lot: Lot, alt_role_mode: bool },
    /// The standing bid changed.
    BidUpdated {
        bidder: String,
        amount: Credits,
        deadline_ms: u64,
    },
    /// A buzz claim was accepted.
    BuzzAccepted { claimant: String, deadline_ms: u64 },
    /// Countdown frozen.
    AuctionPaused {
        elapsed_secs: u64,
        remaining_secs: u64,
        presence: Vec<PresenceStatus>,
    },
    /// Countdown restored.
    AuctionResumed {
        #[serde(skip_serializing_if = "Option::is_none")]
        deadline_ms: Option<u64>,
        presence: Vec<PresenceStatus>,
    },
    /// Auction reset to Idle without an award.
    AuctionCancelled,
    /// Award completed.
    AuctionSettled {
        lot: Lot,
        winner: String,
        amount: Credits,
        cascade: Vec<Lot>,
    },
    /// Moderator sub-group only: enter the price for a buzzer win.
    PriceRequested { lot: Lot, claimant: String },
    /// Presence roster update.
    Presence { entries: Vec<PresenceStatus> },
    /// Caller only: action throttled, retry hint in milliseconds.
    RateLimited { retry_after_ms: u64 },
    /// Countdown length changed.
    TimerUpdated { secs: u64 },
    /// Bidding protocol switched.
    BuzzerModeUpdated { on: bool },
    /// Goalkeeper block cascade toggled.
    GoalkeeperBlockUpdated { on: bool },
    /// Moderator sub-group only: a participant proposed a player.
    PlayerSuggested { nick: String, player: String },
    /// League-wide budget recap after settlement.
    SummaryUpdated { summary: LeagueSummary },
    /// Full state replay.
    State { state: Snapshot },
}

impl ServerMessage {
    pub fn connected(league: &str) -> Self {
        Self::Connected {
            league: league.to_string(),
        }
    }
    pub fn settled(settled: Settled) -> Self {
        Self::AuctionSettled {
            lot: settled.lot,
            winner: settled.winner,
            amount: settled.amount,
            cascade: settled.cascade,
        }
    }
    pub fn presence(entries: Vec<PresenceStatus>) -> Self {
        Self::Presence { entries }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

/// Parses one inbound frame. Malformed frames are dropped by the caller.
pub fn decode(frame: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(frame)
}
