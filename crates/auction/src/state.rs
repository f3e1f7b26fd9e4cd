use super::*;
use asta_core::*;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use std::time::SystemTime;

/// A catalog player put up for auction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    /// Stable catalog key from the imported player list.
    pub catalog: i64,
    pub name: String,
    pub role: Role,
    /// Alternate-scheme role label, shown when the league runs alt-role mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_role: Option<String>,
    /// Real-world source club. Drives the goalkeeper block cascade.
    pub club: String,
}

/// Reasons an action mutates nothing. Silent to the group by design:
/// clients converge on the next state broadcast instead of error payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reject {
    /// Auction is paused; bids, buzzes, and finalization wait for resume.
    Paused,
    /// Resume requested while not paused.
    NotPaused,
    /// Pause requested while already paused.
    AlreadyPaused,
    /// Numeric bids are ignored while buzzer mode is active.
    BuzzerMode,
    /// Buzz claims and moderator price entry only apply to buzzer-mode
    /// auctions.
    NumericMode,
    /// No lot is currently up for auction.
    NoLot,
    /// Bid did not exceed the standing bid.
    NotIncreasing,
    /// Caller's view of the prior bid was stale.
    StaleExpectation,
    /// Finalize requested before the published deadline.
    Premature,
    /// The lot instance was already concluded.
    Concluded,
    /// Price entry requested before the test-and-set latched.
    NotConcluded,
    /// Buzz from the current claimant while its deadline is still live.
    DuplicateClaim,
}

impl std::fmt::Display for Reject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Paused => "auction is paused",
            Self::NotPaused => "auction is not paused",
            Self::AlreadyPaused => "auction is already paused",
            Self::BuzzerMode => "buzzer mode is active",
            Self::NumericMode => "numeric mode is active",
            Self::NoLot => "no lot in auction",
            Self::NotIncreasing => "bid does not exceed the standing bid",
            Self::StaleExpectation => "stale prior-bid expectation",
            Self::Premature => "deadline has not expired",
            Self::Concluded => "lot already concluded",
            Self::NotConcluded => "lot not concluded yet",
            Self::DuplicateClaim => "claimant already holds the buzz",
        };
        write!(f, "{}", s)
    }
}

impl std::error::Error for Reject {}

/// Everything settlement needs, captured under the league lock at the
/// test-and-set. The lock is released before any persistence I/O; the
/// `concluded` latch is what prevents a second ticket for this lot.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementTicket {
    pub lot: Lot,
    pub leader: Option<String>,
    pub bid: Credits,
    pub buzzer: bool,
    pub goalkeeper_block: bool,
}

/// Per-league auction record. Owned exclusively by the store and mutated
/// only inside its critical section; callers receive [`Snapshot`] copies,
/// never live references.
#[derive(Clone, Debug)]
pub struct AuctionState {
    pub(crate) lot: Option<Lot>,
    pub(crate) leader: Option<String>,
    pub(crate) bid: Credits,
    pub(crate) concluded: bool,
    pub(crate) timer_secs: u64,
    pub(crate) goalkeeper_block: bool,
    pub(crate) alt_role_mode: bool,
    pub(crate) buzzer_mode: bool,
    pub(crate) started_at: Option<SystemTime>,
    pub(crate) paused: bool,
    pub(crate) pause_started_at: Option<SystemTime>,
    pub(crate) accumulated_pause: Duration,
    pub(crate) deadline: Option<SystemTime>,
    pub(crate) remaining_at_pause: Option<Duration>,
}

impl Default for AuctionState {
    fn default() -> Self {
        Self {
            lot: None,
            leader: None,
            bid: 0,
            concluded: false,
            timer_secs: DEFAULT_TIMER_SECS,
            goalkeeper_block: true,
            alt_role_mode: false,
            buzzer_mode: false,
            started_at: None,
            paused: false,
            pause_started_at: None,
            accumulated_pause: Duration::ZERO,
            deadline: None,
            remaining_at_pause: None,
        }
    }
}

impl AuctionState {
    pub fn lot(&self) -> Option<&Lot> {
        self.lot.as_ref()
    }
    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }
    pub fn bid(&self) -> Credits {
        self.bid
    }
    pub fn concluded(&self) -> bool {
        self.concluded
    }
    pub fn paused(&self) -> bool {
        self.paused
    }
    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline
    }
    pub fn timer_secs(&self) -> u64 {
        self.timer_secs
    }
    pub fn buzzer_mode(&self) -> bool {
        self.buzzer_mode
    }
    pub fn goalkeeper_block(&self) -> bool {
        self.goalkeeper_block
    }
}

/// League settings. These survive cancel and settlement; only a new
/// explicit setting changes them.
impl AuctionState {
    /// Clamped at the floor so the countdown can never be un-winnable.
    pub fn set_timer(&mut self, secs: u64) -> u64 {
        self.timer_secs = secs.max(MIN_TIMER_SECS);
        self.timer_secs
    }
    pub fn set_goalkeeper_block(&mut self, on: bool) {
        self.goalkeeper_block = on;
    }
    pub fn set_buzzer_mode(&mut self, on: bool) {
        self.buzzer_mode = on;
    }
    pub fn set_alt_role_mode(&mut self, on: bool) {
        self.alt_role_mode = on;
    }
}

impl AuctionState {
    /// Re-arms the countdown from `now`. No-op while paused: the deadline
    /// and the pause flag are never both live.
    pub(crate) fn arm_deadline(&mut self, now: SystemTime) {
        if !self.paused {
            self.deadline = Some(now + Duration::from_secs(self.timer_secs));
        }
    }
    /// Immutable copy for reconnect replay and broadcasts.
    pub fn snapshot(&self, now: SystemTime) -> Snapshot {
        Snapshot {
            lot: self.lot.clone(),
            leader: self.leader.clone(),
            bid: self.bid,
            concluded: self.concluded,
            paused: self.paused,
            buzzer_mode: self.buzzer_mode,
            alt_role_mode: self.alt_role_mode,
            timer_secs: self.timer_secs,
            deadline_ms: self.deadline.map(epoch_ms),
            remaining_secs: self.remaining(now),
        }
    }
}

/// Immutable view of a league's auction, safe to hold across awaits.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<Lot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    pub bid: Credits,
    pub concluded: bool,
    pub paused: bool,
    pub buzzer_mode: bool,
    pub alt_role_mode: bool,
    pub timer_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    pub remaining_secs: u64,
}
