use asta_auction::Auctioneer;
use asta_auction::ServerMessage;
use asta_core::ID;
use asta_core::LeagueKey;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

type Tx = UnboundedSender<String>;

/// Marker for connection identifiers.
pub struct Session;

/// One league's connected sockets. Moderator sessions additionally sit in
/// the admin sub-group, the target for moderator-only frames.
#[derive(Default)]
struct Group {
    members: HashMap<ID<Session>, Tx>,
    admins: HashSet<ID<Session>>,
}

/// Manages per-league broadcast groups and their lifecycles. Leagues come
/// into existence when the first socket joins and dissolve when the last
/// one leaves.
pub struct Lobby {
    auctioneer: Arc<Auctioneer>,
    groups: RwLock<HashMap<LeagueKey, Group>>,
}

impl Lobby {
    pub fn new(auctioneer: Arc<Auctioneer>) -> Self {
        Self {
            auctioneer,
            groups: RwLock::new(HashMap::new()),
        }
    }
    pub fn auctioneer(&self) -> &Auctioneer {
        &self.auctioneer
    }

    /// Adds a socket to the league group; returns its identity and the
    /// outbound frame channel.
    pub async fn join(&self, league: &LeagueKey) -> (ID<Session>, UnboundedReceiver<String>) {
        let id = ID::default();
        let (tx, rx) = unbounded_channel();
        let mut groups = self.groups.write().await;
        groups.entry(league.clone()).or_default().members.insert(id, tx);
        log::debug!("[lobby {}] session {} joined", league, id);
        (id, rx)
    }

    /// Removes a socket; drops the league group when it empties.
    pub async fn leave(&self, league: &LeagueKey, id: ID<Session>) {
        let mut groups = self.groups.write().await;
        if let Some(group) = groups.get_mut(league) {
            group.members.remove(&id);
            group.admins.remove(&id);
            if group.members.is_empty() {
                groups.remove(league);
            }
        }
        log::debug!("[lobby {}] session {} left", league, id);
    }

    /// Puts a session in the moderator sub-group.
    pub async fn promote(&self, league: &LeagueKey, id: ID<Session>) {
        let mut groups = self.groups.write().await;
        if let Some(group) = groups.get_mut(league) {
            if group.members.contains_key(&id) {
                group.admins.insert(id);
            }
        }
    }

    /// Sends to every socket in the league. Dead channels are skipped; the
    /// bridge loop reaps them on its own.
    pub async fn broadcast(&self, league: &LeagueKey, message: &ServerMessage) {
        let json = message.to_json();
        let groups = self.groups.read().await;
        if let Some(group) = groups.get(league) {
            for tx in group.members.values() {
                let _ = tx.send(json.clone());
            }
        }
    }

    /// Sends to moderator sessions only.
    pub async fn broadcast_admins(&self, league: &LeagueKey, message: &ServerMessage) {
        let json = message.to_json();
        let groups = self.groups.read().await;
        if let Some(group) = groups.get(league) {
            for id in &group.admins {
                if let Some(tx) = group.members.get(id) {
                    let _ = tx.send(json.clone());
                }
            }
        }
    }

    /// Sends to one session only.
    pub async fn send(&self, league: &LeagueKey, id: ID<Session>, message: &ServerMessage) {
        let groups = self.groups.read().await;
        if let Some(tx) = groups.get(league).and_then(|g| g.members.get(&id)) {
            let _ = tx.send(message.to_json());
        }
    }
}
