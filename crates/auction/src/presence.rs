use asta_core::LIVENESS_WINDOW;
use asta_core::LeagueKey;
use serde::Serialize;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::Mutex;

/// Ready acknowledgement kind: before first lot, or before a resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyKind {
    Start,
    Resume,
}

#[derive(Clone, Debug)]
struct PresenceEntry {
    is_admin: bool,
    last_seen: SystemTime,
    ready_start: bool,
    ready_resume: bool,
}

/// One participant's line in a presence snapshot.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PresenceStatus {
    pub nick: String,
    pub is_admin: bool,
    pub online: bool,
    /// "waiting" while the league auction is paused, else "online"/"offline".
    pub status: &'static str,
    pub ready_start: bool,
    pub ready_resume: bool,
}

/// Per-league, per-nickname liveness and ready flags. Independent of auction
/// state; consumed by pause/resume broadcasts. Entries are never deleted on
/// disconnect, only aged out, so a reconnecting participant resumes its
/// prior ready flags.
pub struct PresenceTracker {
    leagues: Mutex<HashMap<LeagueKey, HashMap<String, PresenceEntry>>>,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            leagues: Mutex::new(HashMap::new()),
        }
    }

    /// Upserts an entry, refreshing liveness. The admin flag is sticky:
    /// once a nickname registers as admin it stays admin.
    pub async fn register(&self, league: &LeagueKey, nick: &str, is_admin: bool, now: SystemTime) {
        let mut leagues = self.leagues.lock().await;
        let entry = leagues
            .entry(league.clone())
            .or_default()
            .entry(nick.to_string())
            .or_insert(PresenceEntry {
                is_admin,
                last_seen: now,
                ready_start: false,
                ready_resume: false,
            });
        entry.is_admin |= is_admin;
        entry.last_seen = now;
    }

    /// Fire-and-forget liveness refresh. Unknown nicknames are upserted so a
    /// heartbeat arriving before register still counts.
    pub async fn heartbeat(&self, league: &LeagueKey, nick: &str, now: SystemTime) {
        self.register(league, nick, false, now).await;
    }

    pub async fn mark_ready(&self, league: &LeagueKey, nick: &str, kind: ReadyKind, now: SystemTime) {
        self.register(league, nick, false, now).await;
        let mut leagues = self.leagues.lock().await;
        if let Some(entry) = leagues
            .get_mut(league)
            .and_then(|entries| entries.get_mut(nick))
        {
            match kind {
                ReadyKind::Start => entry.ready_start = true,
                ReadyKind::Resume => entry.ready_resume = true,
            }
        }
    }

    /// Point-in-time view for broadcast to the league and its moderator
    /// sub-channel.
    pub async fn snapshot(
        &self,
        league: &LeagueKey,
        paused: bool,
        now: SystemTime,
    ) -> Vec<PresenceStatus> {
        let leagues = self.leagues.lock().await;
        let mut entries: Vec<PresenceStatus> = leagues
            .get(league)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(nick, entry)| {
                        let online = now
                            .duration_since(entry.last_seen)
                            .map(|age| age < LIVENESS_WINDOW)
                            .unwrap_or(true);
                        PresenceStatus {
                            nick: nick.clone(),
                            is_admin: entry.is_admin,
                            online,
                            status: match (paused, online) {
                                (true, _) => "waiting",
                                (false, true) => "online",
                                (false, false) => "offline",
                            },
                            ready_start: entry.ready_start,
                            ready_resume: entry.ready_resume,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.nick.cmp(&b.nick));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use std::time::UNIX_EPOCH;

    fn t(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(5_000_000 + secs)
    }

    #[tokio::test]
    async fn liveness_ages_out_at_threshold() {
        let presence = PresenceTracker::new();
        let league = LeagueKey::from("alpha");
        presence.register(&league, "ada", false, t(0)).await;
        let snap = presence.snapshot(&league, false, t(44)).await;
        assert!(snap[0].online);
        assert_eq!(snap[0].status, "online");
        let snap = presence.snapshot(&league, false, t(45)).await;
        assert!(!snap[0].online);
        assert_eq!(snap[0].status, "offline");
    }

    #[tokio::test]
    async fn paused_league_reports_waiting() {
        let presence = PresenceTracker::new();
        let league = LeagueKey::from("alpha");
        presence.register(&league, "ada", false, t(0)).await;
        let snap = presence.snapshot(&league, true, t(1)).await;
        assert_eq!(snap[0].status, "waiting");
    }

    #[tokio::test]
    async fn admin_flag_is_sticky() {
        let presence = PresenceTracker::new();
        let league = LeagueKey::from("alpha");
        presence.register(&league, "ada", true, t(0)).await;
        presence.register(&league, "ada", false, t(1)).await;
        let snap = presence.snapshot(&league, false, t(2)).await;
        assert!(snap[0].is_admin);
    }

    #[tokio::test]
    async fn ready_flags_survive_heartbeats() {
        let presence = PresenceTracker::new();
        let league = LeagueKey::from("alpha");
        presence.register(&league, "ada", false, t(0)).await;
        presence
            .mark_ready(&league, "ada", ReadyKind::Resume, t(1))
            .await;
        presence.heartbeat(&league, "ada", t(2)).await;
        let snap = presence.snapshot(&league, false, t(3)).await;
        assert!(snap[0].ready_resume);
        assert!(!snap[0].ready_start);
    }

    #[tokio::test]
    async fn snapshot_sorts_by_nick() {
        let presence = PresenceTracker::new();
        let league = LeagueKey::from("alpha");
        presence.register(&league, "zoe", false, t(0)).await;
        presence.register(&league, "ada", false, t(0)).await;
        let snap = presence.snapshot(&league, false, t(1)).await;
        assert_eq!(snap[0].nick, "ada");
        assert_eq!(snap[1].nick, "zoe");
    }
}
