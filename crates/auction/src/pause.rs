use super::*;
use std::time::Duration;
use std::time::SystemTime;

/// Countdown freeze/restore with second-level fidelity. This is the single
/// authoritative implementation of the pause bookkeeping: pause captures the
/// time left and clears the deadline; resume accumulates the paused span and
/// recomputes the deadline from the captured remainder.
impl AuctionState {
    /// Freezes the countdown. No-op when already paused.
    pub fn pause(&mut self, now: SystemTime) -> Result<PauseInfo, Reject> {
        if self.paused {
            return Err(Reject::AlreadyPaused);
        }
        self.paused = true;
        self.pause_started_at = Some(now);
        self.remaining_at_pause = self
            .deadline
            .take()
            .map(|deadline| deadline.duration_since(now).unwrap_or_default());
        Ok(PauseInfo {
            elapsed_secs: self.elapsed(now).as_secs(),
            remaining_secs: self.remaining(now),
        })
    }

    /// Restores the countdown. No-op when not paused.
    pub fn resume(&mut self, now: SystemTime) -> Result<ResumeInfo, Reject> {
        if !self.paused {
            return Err(Reject::NotPaused);
        }
        if let Some(started) = self.pause_started_at.take() {
            self.accumulated_pause += now.duration_since(started).unwrap_or_default();
        }
        self.paused = false;
        self.deadline = self.remaining_at_pause.take().map(|left| now + left);
        Ok(ResumeInfo {
            deadline: self.deadline,
        })
    }

    /// Time the current lot has been under the hammer, net of every pause
    /// (including one still in progress). Display/diagnostics only.
    pub fn elapsed(&self, now: SystemTime) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let gross = now.duration_since(started).unwrap_or_default();
        let current_pause = match (self.paused, self.pause_started_at) {
            (true, Some(since)) => now.duration_since(since).unwrap_or_default(),
            _ => Duration::ZERO,
        };
        gross
            .saturating_sub(self.accumulated_pause)
            .saturating_sub(current_pause)
    }

    /// Whole seconds left on the countdown, rounded up. While paused this
    /// reads the frozen remainder.
    pub fn remaining(&self, now: SystemTime) -> u64 {
        if self.paused {
            return ceil_secs(self.remaining_at_pause.unwrap_or_default());
        }
        match self.deadline {
            Some(deadline) => ceil_secs(deadline.duration_since(now).unwrap_or_default()),
            None => 0,
        }
    }
}

/// Pause acknowledgement for broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct PauseInfo {
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

/// Resume acknowledgement for broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct ResumeInfo {
    pub deadline: Option<SystemTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use asta_core::Role;
    use std::time::UNIX_EPOCH;

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_000_000 + secs)
    }
    fn lot() -> Lot {
        Lot {
            catalog: 7,
            name: "Verdi".to_string(),
            role: Role::Forward,
            alt_role: None,
            club: "Como".to_string(),
        }
    }

    #[test]
    fn pause_resume_preserves_remaining_time() {
        let mut state = AuctionState::default();
        state.set_timer(5);
        state.start(lot(), false, t(0));
        state.submit_bid("ada", 1, None, t(0)).unwrap();
        assert_eq!(state.deadline(), Some(t(5)));
        let info = state.pause(t(2)).unwrap();
        assert_eq!(info.remaining_secs, 3);
        assert!(state.deadline().is_none());
        let info = state.resume(t(10)).unwrap();
        assert_eq!(info.deadline, Some(t(13)));
        assert_eq!(state.deadline(), Some(t(13)));
    }

    #[test]
    fn double_pause_and_double_resume_are_noops() {
        let mut state = AuctionState::default();
        state.start(lot(), false, t(0));
        assert!(state.pause(t(1)).is_ok());
        assert_eq!(state.pause(t(2)), Err(Reject::AlreadyPaused));
        assert!(state.resume(t(3)).is_ok());
        assert_eq!(state.resume(t(4)), Err(Reject::NotPaused));
    }

    #[test]
    fn pause_without_deadline_restores_no_deadline() {
        let mut state = AuctionState::default();
        state.start(lot(), false, t(0));
        state.pause(t(1)).unwrap();
        let info = state.resume(t(5)).unwrap();
        assert_eq!(info.deadline, None);
    }

    #[test]
    fn elapsed_excludes_pauses() {
        let mut state = AuctionState::default();
        state.start(lot(), false, t(0));
        state.pause(t(10)).unwrap();
        // mid-pause: the running pause is excluded too
        assert_eq!(state.elapsed(t(25)).as_secs(), 10);
        state.resume(t(30)).unwrap();
        assert_eq!(state.elapsed(t(40)).as_secs(), 20);
        state.pause(t(41)).unwrap();
        state.resume(t(43)).unwrap();
        assert_eq!(state.elapsed(t(50)).as_secs(), 28);
    }

    #[test]
    fn expired_remainder_clamps_to_zero() {
        let mut state = AuctionState::default();
        state.set_timer(2);
        state.start(lot(), false, t(0));
        state.submit_bid("ada", 1, None, t(0)).unwrap();
        state.pause(t(60)).unwrap();
        assert_eq!(state.remaining(t(60)), 0);
        let info = state.resume(t(70)).unwrap();
        assert_eq!(info.deadline, Some(t(70)));
    }

    #[test]
    fn actions_refused_while_paused() {
        let mut state = AuctionState::default();
        state.start(lot(), false, t(0));
        state.submit_bid("ada", 1, None, t(0)).unwrap();
        state.pause(t(1)).unwrap();
        assert_eq!(state.submit_bid("bob", 2, None, t(2)), Err(Reject::Paused));
        assert_eq!(state.conclude(t(2)), Err(Reject::Paused));
        assert_eq!(state.buzz("bob", t(2)), Err(Reject::Paused));
    }
}
