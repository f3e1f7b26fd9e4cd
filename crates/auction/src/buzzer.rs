use super::*;
use asta_core::Credits;
use std::time::SystemTime;

/// An accepted buzz claim, ready for broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct BuzzAccepted {
    pub claimant: String,
    pub deadline: SystemTime,
}

/// Buzz-in mode: the claim (claimant identity only) is authoritative and the
/// numeric bid plays no settlement role. Finalization does not auto-award;
/// moderators supply the price afterwards.
impl AuctionState {
    /// Registers a buzz claim. A repeat buzz from the current claimant while
    /// its countdown is still live is dropped so the same leader cannot spam
    /// re-broadcasts; anyone else (or an expired countdown) takes the claim
    /// and re-arms the countdown.
    pub fn buzz(&mut self, claimant: &str, now: SystemTime) -> Result<BuzzAccepted, Reject> {
        if self.paused {
            return Err(Reject::Paused);
        }
        if !self.buzzer_mode {
            return Err(Reject::NumericMode);
        }
        if self.lot.is_none() {
            return Err(Reject::NoLot);
        }
        let live = self.deadline.map(|d| now < d).unwrap_or(false);
        if live && self.leader.as_deref() == Some(claimant) {
            return Err(Reject::DuplicateClaim);
        }
        self.leader = Some(claimant.to_string());
        self.arm_deadline(now);
        Ok(BuzzAccepted {
            claimant: claimant.to_string(),
            deadline: self.deadline.unwrap_or(now),
        })
    }

    /// Builds the settlement ticket for the moderator-priced award that
    /// completes a buzzer-mode auction. Requires the finalize test-and-set
    /// to have latched already. Consumes the lot under the league lock, so
    /// a second price entry for the same lot dissolves into a rejection
    /// instead of a duplicate award broadcast.
    pub fn assignment(&mut self, price: Credits) -> Result<SettlementTicket, Reject> {
        if !self.buzzer_mode {
            return Err(Reject::NumericMode);
        }
        if !self.concluded {
            return Err(Reject::NotConcluded);
        }
        let lot = self.lot.take().ok_or(Reject::NoLot)?;
        Ok(SettlementTicket {
            lot,
            leader: self.leader.clone(),
            bid: price,
            buzzer: true,
            goalkeeper_block: self.goalkeeper_block,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asta_core::Role;
    use std::time::Duration;
    use std::time::UNIX_EPOCH;

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(2_000_000 + secs)
    }
    fn lot() -> Lot {
        Lot {
            catalog: 9,
            name: "Bianchi".to_string(),
            role: Role::Midfielder,
            alt_role: Some("M".to_string()),
            club: "Pisa".to_string(),
        }
    }
    fn buzzer_state() -> AuctionState {
        let mut state = AuctionState::default();
        state.set_buzzer_mode(true);
        state.set_timer(5);
        state.start(lot(), false, t(0));
        state
    }

    #[test]
    fn buzz_takes_the_claim_and_arms_countdown() {
        let mut state = buzzer_state();
        let accepted = state.buzz("ada", t(0)).unwrap();
        assert_eq!(accepted.claimant, "ada");
        assert_eq!(accepted.deadline, t(5));
        assert_eq!(state.leader(), Some("ada"));
    }

    #[test]
    fn repeat_buzz_from_leader_is_dropped_while_live() {
        let mut state = buzzer_state();
        state.buzz("ada", t(0)).unwrap();
        assert_eq!(state.buzz("ada", t(1)), Err(Reject::DuplicateClaim));
        // a rival can still take over, re-arming from their instant
        let accepted = state.buzz("bob", t(2)).unwrap();
        assert_eq!(accepted.deadline, t(7));
        // and after expiry the original leader can re-claim
        assert!(state.buzz("bob", t(20)).is_ok());
    }

    #[test]
    fn numeric_bids_ignored_in_buzzer_mode() {
        let mut state = buzzer_state();
        assert_eq!(
            state.submit_bid("ada", 10, None, t(0)),
            Err(Reject::BuzzerMode)
        );
    }

    #[test]
    fn assignment_requires_the_latch() {
        let mut state = buzzer_state();
        state.buzz("ada", t(0)).unwrap();
        assert_eq!(state.assignment(30), Err(Reject::NotConcluded));
        state.conclude(t(10)).unwrap();
        let ticket = state.assignment(30).unwrap();
        assert!(ticket.buzzer);
        assert_eq!(ticket.leader.as_deref(), Some("ada"));
        assert_eq!(ticket.bid, 30);
    }

    #[test]
    fn buzz_ignored_in_numeric_mode() {
        let mut state = AuctionState::default();
        state.start(lot(), false, t(0));
        state.submit_bid("ada", 10, None, t(0)).unwrap();
        assert_eq!(state.buzz("bob", t(1)), Err(Reject::NumericMode));
        // the standing leader is untouched
        assert_eq!(state.leader(), Some("ada"));
        assert_eq!(state.bid(), 10);
    }

    #[test]
    fn price_entry_consumes_the_lot() {
        let mut state = buzzer_state();
        state.buzz("ada", t(0)).unwrap();
        state.conclude(t(10)).unwrap();
        assert!(state.assignment(30).is_ok());
        assert_eq!(state.assignment(30), Err(Reject::NoLot));
    }

    #[test]
    fn assignment_refused_in_numeric_mode() {
        let mut state = AuctionState::default();
        state.start(lot(), false, t(0));
        assert_eq!(state.assignment(30), Err(Reject::NumericMode));
    }
}
