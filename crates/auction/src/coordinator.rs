use super::*;
use asta_core::Credits;
use asta_core::LeagueKey;
use std::sync::Arc;
use std::time::SystemTime;

/// Result of one inbound action, for the hosting layer to fan out. Rejected
/// actions collapse into [`Outcome::Ignored`]: the protocol favors
/// convergence on the next state broadcast over error payloads.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// New lot on the block; broadcast to the league.
    Started(Snapshot),
    /// Accepted bid; broadcast with the re-armed deadline.
    Bid {
        bidder: String,
        amount: Credits,
        deadline_ms: u64,
    },
    /// Accepted buzz claim; broadcast with the re-armed deadline.
    Buzz {
        claimant: String,
        deadline_ms: u64,
    },
    /// Countdown frozen; includes a presence snapshot for the waiting room.
    Paused {
        elapsed_secs: u64,
        remaining_secs: u64,
        presence: Vec<PresenceStatus>,
    },
    /// Countdown restored.
    Resumed {
        deadline_ms: Option<u64>,
        presence: Vec<PresenceStatus>,
    },
    /// Auction reset to Idle by a moderator.
    Cancelled,
    /// Concluded with nothing to award; league reset to Idle.
    Voided,
    /// Award completed and persisted.
    Settled {
        settled: Settled,
        summary: LeagueSummary,
    },
    /// Buzzer-mode finalize: moderators must now enter the price.
    PriceRequested {
        lot: Lot,
        claimant: String,
    },
    /// Caller-only throttle hint; never broadcast.
    RateLimited(RetryAfter),
    /// Countdown length changed; broadcast so clients re-tune sounds.
    TimerSet(u64),
    /// Bidding protocol switched between numeric and buzz-in.
    BuzzerModeSet(bool),
    /// Goalkeeper block cascade toggled.
    GoalkeeperBlockSet(bool),
    /// Presence roster changed; broadcast to league and moderators.
    Presence(Vec<PresenceStatus>),
    /// Full state replay for the caller only.
    State(Snapshot),
    /// Silently rejected; nothing changed, nothing to send.
    Ignored,
}

/// Engine facade: one method per inbound action. Owns the per-league store,
/// clock, rate limiter, presence tracker, and settlement coordinator.
/// Persistence and broadcast I/O always happen after the league lock is
/// released; the concluded latch, not the lock, is what makes finalization
/// exactly-once.
pub struct Auctioneer {
    store: AuctionStore,
    presence: PresenceTracker,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    settler: Settler,
    summary: Arc<dyn SummaryGateway>,
}

impl Auctioneer {
    pub fn new(
        clock: Arc<dyn Clock>,
        roster: Arc<dyn RosterGateway>,
        summary: Arc<dyn SummaryGateway>,
    ) -> Self {
        Self {
            store: AuctionStore::new(),
            presence: PresenceTracker::new(),
            limiter: RateLimiter::new(),
            clock,
            settler: Settler::new(roster),
            summary,
        }
    }

    fn now(&self) -> SystemTime {
        self.clock.now()
    }
}

/// Presence actions.
impl Auctioneer {
    pub async fn register(&self, league: &LeagueKey, nick: &str, is_admin: bool) -> Outcome {
        let now = self.now();
        self.presence.register(league, nick, is_admin, now).await;
        log::debug!("[auctioneer {}] registered {} (admin={})", league, nick, is_admin);
        Outcome::Presence(self.roster_snapshot(league, now).await)
    }
    pub async fn heartbeat(&self, league: &LeagueKey, nick: &str) {
        self.presence.heartbeat(league, nick, self.now()).await;
    }
    pub async fn mark_ready(&self, league: &LeagueKey, nick: &str, kind: ReadyKind) -> Outcome {
        let now = self.now();
        self.presence.mark_ready(league, nick, kind, now).await;
        Outcome::Presence(self.roster_snapshot(league, now).await)
    }
    async fn roster_snapshot(&self, league: &LeagueKey, now: SystemTime) -> Vec<PresenceStatus> {
        let paused = self.store.with(league, |s| s.paused()).await;
        self.presence.snapshot(league, paused, now).await
    }
}

/// Auction actions.
impl Auctioneer {
    pub async fn start_auction(&self, league: &LeagueKey, lot: Lot, alt_role: bool) -> Outcome {
        let now = self.now();
        log::info!("[auctioneer {}] starting auction for {}", league, lot.name);
        let snapshot = self.store.with(league, |s| s.start(lot, alt_role, now)).await;
        Outcome::Started(snapshot)
    }

    pub async fn submit_bid(
        &self,
        league: &LeagueKey,
        bidder: &str,
        amount: Credits,
        expected: Option<Credits>,
    ) -> Outcome {
        let now = self.now();
        if let Err(wait) = self.limiter.check(league, Throttle::Bid, now).await {
            return Outcome::RateLimited(wait);
        }
        let result = self
            .store
            .with(league, |s| s.submit_bid(bidder, amount, expected, now))
            .await;
        match result {
            Ok(accepted) => Outcome::Bid {
                bidder: accepted.bidder,
                amount: accepted.amount,
                deadline_ms: epoch_ms(accepted.deadline),
            },
            Err(reject) => {
                log::debug!("[auctioneer {}] bid by {} dropped: {}", league, bidder, reject);
                Outcome::Ignored
            }
        }
    }

    pub async fn buzz(&self, league: &LeagueKey, claimant: &str) -> Outcome {
        let now = self.now();
        if let Err(wait) = self.limiter.check(league, Throttle::Buzz, now).await {
            return Outcome::RateLimited(wait);
        }
        match self.store.with(league, |s| s.buzz(claimant, now)).await {
            Ok(accepted) => Outcome::Buzz {
                claimant: accepted.claimant,
                deadline_ms: epoch_ms(accepted.deadline),
            },
            Err(reject) => {
                log::debug!("[auctioneer {}] buzz by {} dropped: {}", league, claimant, reject);
                Outcome::Ignored
            }
        }
    }

    pub async fn pause(&self, league: &LeagueKey) -> Outcome {
        let now = self.now();
        match self.store.with(league, |s| s.pause(now)).await {
            Ok(info) => Outcome::Paused {
                elapsed_secs: info.elapsed_secs,
                remaining_secs: info.remaining_secs,
                presence: self.roster_snapshot(league, now).await,
            },
            Err(_) => Outcome::Ignored,
        }
    }

    pub async fn resume(&self, league: &LeagueKey) -> Outcome {
        let now = self.now();
        match self.store.with(league, |s| s.resume(now)).await {
            Ok(info) => Outcome::Resumed {
                deadline_ms: info.deadline.map(epoch_ms),
                presence: self.roster_snapshot(league, now).await,
            },
            Err(_) => Outcome::Ignored,
        }
    }

    pub async fn cancel(&self, league: &LeagueKey) -> Outcome {
        self.store.with(league, |s| s.cancel()).await;
        self.limiter.clear(league).await;
        log::info!("[auctioneer {}] auction cancelled", league);
        Outcome::Cancelled
    }

    pub async fn set_timer(&self, league: &LeagueKey, secs: u64) -> Outcome {
        let clamped = self.store.with(league, |s| s.set_timer(secs)).await;
        Outcome::TimerSet(clamped)
    }

    pub async fn set_buzzer_mode(&self, league: &LeagueKey, on: bool) -> Outcome {
        self.store.with(league, |s| s.set_buzzer_mode(on)).await;
        log::info!("[auctioneer {}] buzzer mode {}", league, on);
        Outcome::BuzzerModeSet(on)
    }

    pub async fn set_goalkeeper_block(&self, league: &LeagueKey, on: bool) -> Outcome {
        self.store.with(league, |s| s.set_goalkeeper_block(on)).await;
        log::info!("[auctioneer {}] goalkeeper block {}", league, on);
        Outcome::GoalkeeperBlockSet(on)
    }

    pub async fn request_state(&self, league: &LeagueKey) -> Outcome {
        let now = self.now();
        Outcome::State(self.store.with(league, |s| s.snapshot(now)).await)
    }
}

/// Finalization. The test-and-set runs under the league lock; persistence
/// and summary I/O follow with the lock released.
impl Auctioneer {
    /// Client-driven deadline enforcement: callers ask when they believe
    /// time is up, and the guard chain re-validates. Early or duplicate
    /// requests dissolve into [`Outcome::Ignored`].
    pub async fn finalize(&self, league: &LeagueKey) -> anyhow::Result<Outcome> {
        let now = self.now();
        let ticket = match self.store.with(league, |s| s.conclude(now)).await {
            Ok(ticket) => ticket,
            Err(reject) => {
                log::debug!("[auctioneer {}] finalize dropped: {}", league, reject);
                return Ok(Outcome::Ignored);
            }
        };
        if ticket.buzzer {
            let claimant = match ticket.leader {
                Some(claimant) => claimant,
                None => return Ok(self.void(league).await),
            };
            log::info!("[auctioneer {}] price requested for {}", league, ticket.lot.name);
            return Ok(Outcome::PriceRequested {
                lot: ticket.lot,
                claimant,
            });
        }
        self.award(league, &ticket).await
    }

    /// Completes a buzzer-mode auction with the moderator-entered price.
    pub async fn assign_price(&self, league: &LeagueKey, price: Credits) -> anyhow::Result<Outcome> {
        let ticket = match self.store.with(league, |s| s.assignment(price)).await {
            Ok(ticket) => ticket,
            Err(reject) => {
                log::debug!("[auctioneer {}] price entry dropped: {}", league, reject);
                return Ok(Outcome::Ignored);
            }
        };
        self.award(league, &ticket).await
    }

    async fn award(&self, league: &LeagueKey, ticket: &SettlementTicket) -> anyhow::Result<Outcome> {
        match self.settler.settle(league, ticket).await? {
            Some(settled) => {
                let summary = self.summary.league_summary(league).await?;
                self.clear(league).await;
                Ok(Outcome::Settled { settled, summary })
            }
            None => Ok(self.void(league).await),
        }
    }

    async fn void(&self, league: &LeagueKey) -> Outcome {
        self.clear(league).await;
        Outcome::Voided
    }

    async fn clear(&self, league: &LeagueKey) {
        self.store.with(league, |s| s.cancel()).await;
        self.limiter.clear(league).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::tests::FakeRoster;
    use asta_core::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use std::time::UNIX_EPOCH;

    struct TestClock(Mutex<SystemTime>);
    impl TestClock {
        fn at(secs: u64) -> Arc<Self> {
            Arc::new(Self(Mutex::new(t(secs))))
        }
        fn set(&self, secs: u64) {
            *self.0.lock().unwrap() = t(secs);
        }
    }
    impl Clock for TestClock {
        fn now(&self) -> SystemTime {
            *self.0.lock().unwrap()
        }
    }

    struct FakeSummary;
    #[async_trait]
    impl SummaryGateway for FakeSummary {
        async fn league_summary(&self, _league: &LeagueKey) -> anyhow::Result<LeagueSummary> {
            Ok(LeagueSummary { squads: Vec::new() })
        }
    }

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(6_000_000 + secs)
    }
    fn lot() -> Lot {
        Lot {
            catalog: 11,
            name: "Gallo".to_string(),
            role: Role::Forward,
            alt_role: None,
            club: "Parma".to_string(),
        }
    }
    fn rig(clock: Arc<TestClock>, roster: Arc<FakeRoster>) -> Arc<Auctioneer> {
        Arc::new(Auctioneer::new(clock, roster, Arc::new(FakeSummary)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_finalizes_settle_exactly_once() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let roster = Arc::new(FakeRoster::with_squad("ada", &league));
        let auctioneer = rig(clock.clone(), roster.clone());
        auctioneer.start_auction(&league, lot(), false).await;
        auctioneer.submit_bid(&league, "ada", 10, None).await;
        clock.set(60);
        let mut tasks = Vec::new();
        for _ in 0..12 {
            let auctioneer = auctioneer.clone();
            let league = league.clone();
            tasks.push(tokio::spawn(async move {
                auctioneer.finalize(&league).await.unwrap()
            }));
        }
        let mut settled = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), Outcome::Settled { .. }) {
                settled += 1;
            }
        }
        assert_eq!(settled, 1);
        assert_eq!(roster.adds.load(Ordering::SeqCst), 1);
        // league is back to Idle
        let Outcome::State(snap) = auctioneer.request_state(&league).await else {
            panic!("expected state outcome");
        };
        assert!(snap.lot.is_none());
        assert!(!snap.concluded);
    }

    #[tokio::test]
    async fn two_buzzes_in_window_accept_one() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let roster = Arc::new(FakeRoster::with_squad("ada", &league));
        let auctioneer = rig(clock.clone(), roster);
        auctioneer.set_buzzer_mode(&league, true).await;
        auctioneer.start_auction(&league, lot(), false).await;
        let first = auctioneer.buzz(&league, "ada").await;
        assert!(matches!(first, Outcome::Buzz { .. }));
        *clock.0.lock().unwrap() = t(0) + Duration::from_millis(100);
        let second = auctioneer.buzz(&league, "bob").await;
        let Outcome::RateLimited(wait) = second else {
            panic!("expected rate limit");
        };
        assert_eq!(wait.millis, 400);
    }

    #[tokio::test]
    async fn buzzer_finalize_requests_price_then_settles_on_entry() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let roster = Arc::new(FakeRoster::with_squad("ada", &league));
        let auctioneer = rig(clock.clone(), roster.clone());
        auctioneer.set_buzzer_mode(&league, true).await;
        auctioneer.start_auction(&league, lot(), false).await;
        auctioneer.buzz(&league, "ada").await;
        clock.set(60);
        let outcome = auctioneer.finalize(&league).await.unwrap();
        let Outcome::PriceRequested { claimant, .. } = outcome else {
            panic!("expected price request");
        };
        assert_eq!(claimant, "ada");
        assert_eq!(roster.adds.load(Ordering::SeqCst), 0);
        let outcome = auctioneer.assign_price(&league, 25).await.unwrap();
        let Outcome::Settled { settled, .. } = outcome else {
            panic!("expected settlement");
        };
        assert_eq!(settled.amount, 25);
        assert_eq!(roster.adds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_price_entries_settle_once() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let roster = Arc::new(FakeRoster::with_squad("ada", &league));
        let auctioneer = rig(clock.clone(), roster.clone());
        auctioneer.set_buzzer_mode(&league, true).await;
        auctioneer.start_auction(&league, lot(), false).await;
        auctioneer.buzz(&league, "ada").await;
        clock.set(60);
        auctioneer.finalize(&league).await.unwrap();
        let first = auctioneer.assign_price(&league, 25).await.unwrap();
        assert!(matches!(first, Outcome::Settled { .. }));
        // a straggling second entry dissolves without a second broadcast
        let second = auctioneer.assign_price(&league, 25).await.unwrap();
        assert!(matches!(second, Outcome::Ignored));
        assert_eq!(roster.adds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn finalize_with_no_bid_voids_the_auction() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let roster = Arc::new(FakeRoster::with_squad("ada", &league));
        let auctioneer = rig(clock.clone(), roster.clone());
        auctioneer.start_auction(&league, lot(), false).await;
        clock.set(60);
        let outcome = auctioneer.finalize(&league).await.unwrap();
        assert!(matches!(outcome, Outcome::Voided));
        assert_eq!(roster.adds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn collaborator_failure_leaves_latch_set() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let mut roster = FakeRoster::with_squad("ada", &league);
        roster.fail_adds = true;
        let auctioneer = rig(clock.clone(), Arc::new(roster));
        auctioneer.start_auction(&league, lot(), false).await;
        auctioneer.submit_bid(&league, "ada", 10, None).await;
        clock.set(60);
        assert!(auctioneer.finalize(&league).await.is_err());
        // latch stays set: a retry cannot re-award, operator must intervene
        let retry = auctioneer.finalize(&league).await.unwrap();
        assert!(matches!(retry, Outcome::Ignored));
    }

    #[tokio::test]
    async fn premature_finalize_is_ignored() {
        let league = LeagueKey::from("alpha");
        let clock = TestClock::at(0);
        let roster = Arc::new(FakeRoster::with_squad("ada", &league));
        let auctioneer = rig(clock.clone(), roster);
        auctioneer.start_auction(&league, lot(), false).await;
        auctioneer.submit_bid(&league, "ada", 10, None).await;
        clock.set(2);
        let outcome = auctioneer.finalize(&league).await.unwrap();
        assert!(matches!(outcome, Outcome::Ignored));
    }
}
