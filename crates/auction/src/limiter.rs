use asta_core::BID_COOLDOWN;
use asta_core::BUZZ_COOLDOWN;
use asta_core::LeagueKey;
use std::collections::HashMap;
use std::time::Duration;
use std::time::SystemTime;
use tokio::sync::Mutex;

/// Which per-league cooldown an action consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Throttle {
    Buzz,
    Bid,
}

impl Throttle {
    fn window(&self) -> Duration {
        match self {
            Self::Buzz => BUZZ_COOLDOWN,
            Self::Bid => BID_COOLDOWN,
        }
    }
}

/// Hint returned to the throttled caller only; never broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryAfter {
    pub millis: u64,
}

#[derive(Default)]
struct Cooldowns {
    buzz: Option<SystemTime>,
    bid: Option<SystemTime>,
}

/// Collapses near-simultaneous duplicate submissions into one accepted
/// action: the first arrival in a window wins and re-arms the window, later
/// ones get the remaining wait back.
pub struct RateLimiter {
    cooldowns: Mutex<HashMap<LeagueKey, Cooldowns>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            cooldowns: Mutex::new(HashMap::new()),
        }
    }

    /// Accepts and re-arms, or rejects with the remaining wait.
    pub async fn check(
        &self,
        league: &LeagueKey,
        kind: Throttle,
        now: SystemTime,
    ) -> Result<(), RetryAfter> {
        let mut map = self.cooldowns.lock().await;
        let entry = map.entry(league.clone()).or_default();
        let slot = match kind {
            Throttle::Buzz => &mut entry.buzz,
            Throttle::Bid => &mut entry.bid,
        };
        if let Some(armed) = *slot {
            let expires = armed + kind.window();
            if let Ok(left) = expires.duration_since(now) {
                if !left.is_zero() {
                    return Err(RetryAfter {
                        millis: left.as_millis() as u64,
                    });
                }
            }
        }
        *slot = Some(now);
        Ok(())
    }

    /// Drops a league's cooldowns so throttling never bleeds into the
    /// next lot. Called on cancel and settlement.
    pub async fn clear(&self, league: &LeagueKey) {
        self.cooldowns.lock().await.remove(league);
    }
}
