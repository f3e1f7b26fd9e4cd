use super::*;
use asta_core::Credits;
use std::time::SystemTime;

/// An accepted bid, ready for broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct BidAccepted {
    pub bidder: String,
    pub amount: Credits,
    pub deadline: SystemTime,
}

/// Open numeric bidding: start, compare-and-swap bid, cancel, finalize.
impl AuctionState {
    /// Puts a new lot up for auction. Valid from Idle or Concluded; starting
    /// a new lot always resets leader, bid, the concluded latch, and all
    /// pause accounting. The countdown arms on the first bid, not here.
    pub fn start(&mut self, lot: Lot, alt_role_mode: bool, now: SystemTime) -> Snapshot {
        self.lot = Some(lot);
        self.leader = None;
        self.bid = 0;
        self.concluded = false;
        self.alt_role_mode = alt_role_mode;
        self.started_at = Some(now);
        self.paused = false;
        self.pause_started_at = None;
        self.accumulated_pause = std::time::Duration::ZERO;
        self.deadline = None;
        self.remaining_at_pause = None;
        self.snapshot(now)
    }

    /// Compare-and-swap bid submission. `expected` guards against stale UI
    /// state: when supplied it must equal the standing bid or the submission
    /// is rejected even if `amount` would otherwise lead.
    pub fn submit_bid(
        &mut self,
        bidder: &str,
        amount: Credits,
        expected: Option<Credits>,
        now: SystemTime,
    ) -> Result<BidAccepted, Reject> {
        if self.paused {
            return Err(Reject::Paused);
        }
        if self.buzzer_mode {
            return Err(Reject::BuzzerMode);
        }
        if self.lot.is_none() {
            return Err(Reject::NoLot);
        }
        if amount <= self.bid {
            return Err(Reject::NotIncreasing);
        }
        if let Some(prior) = expected {
            if prior != self.bid {
                return Err(Reject::StaleExpectation);
            }
        }
        self.leader = Some(bidder.to_string());
        self.bid = amount;
        self.arm_deadline(now);
        Ok(BidAccepted {
            bidder: bidder.to_string(),
            amount,
            deadline: self.deadline.unwrap_or(now),
        })
    }

    /// Unconditional full reset back to Idle. Idempotent; league settings
    /// (timer, toggles) survive.
    pub fn cancel(&mut self) {
        self.lot = None;
        self.leader = None;
        self.bid = 0;
        self.concluded = false;
        self.started_at = None;
        self.paused = false;
        self.pause_started_at = None;
        self.accumulated_pause = std::time::Duration::ZERO;
        self.deadline = None;
        self.remaining_at_pause = None;
    }

    /// The single test-and-set point. Guard chain: an active lot, not
    /// paused, deadline (if armed) expired, latch not yet set. On success
    /// the latch flips and a [`SettlementTicket`] is captured; concurrent
    /// finalize requests race safely into exactly one ticket.
    pub fn conclude(&mut self, now: SystemTime) -> Result<SettlementTicket, Reject> {
        let lot = self.lot.as_ref().ok_or(Reject::NoLot)?;
        if self.paused {
            return Err(Reject::Paused);
        }
        if let Some(deadline) = self.deadline {
            if now < deadline {
                return Err(Reject::Premature);
            }
        }
        if self.concluded {
            return Err(Reject::Concluded);
        }
        self.concluded = true;
        Ok(SettlementTicket {
            lot: lot.clone(),
            leader: self.leader.clone(),
            bid: self.bid,
            buzzer: self.buzzer_mode,
            goalkeeper_block: self.goalkeeper_block,
        })
    }
}
