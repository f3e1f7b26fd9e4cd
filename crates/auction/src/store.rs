use super::*;
use asta_core::LeagueKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

/// Keyed table of per-league auction records, created lazily with defaults
/// on first access. Every mutation runs inside that league's own exclusive
/// lock; different leagues proceed fully in parallel. No operation ever
/// holds two leagues' locks, and no I/O happens under a lock.
pub struct AuctionStore {
    leagues: RwLock<HashMap<LeagueKey, Arc<Mutex<AuctionState>>>>,
}

impl Default for AuctionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuctionStore {
    pub fn new() -> Self {
        Self {
            leagues: RwLock::new(HashMap::new()),
        }
    }

    /// Runs `f` against the league's state under its exclusive lock.
    /// Nothing escapes the critical section by reference: callers get
    /// whatever owned value `f` returns.
    pub async fn with<R>(
        &self,
        league: &LeagueKey,
        f: impl FnOnce(&mut AuctionState) -> R,
    ) -> R {
        let cell = self.entry(league).await;
        let mut state = cell.lock().await;
        f(&mut state)
    }

    async fn entry(&self, league: &LeagueKey) -> Arc<Mutex<AuctionState>> {
        if let Some(cell) = self.leagues.read().await.get(league) {
            return cell.clone();
        }
        self.leagues
            .write()
            .await
            .entry(league.clone())
            .or_insert_with(|| {
                log::debug!("[store] created state for league {}", league);
                Arc::new(Mutex::new(AuctionState::default()))
            })
            .clone()
    }
}
