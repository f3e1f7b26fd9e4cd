use super::*;
use asta_core::Credits;
use asta_core::ID;
use asta_core::LeagueKey;
use asta_core::Role;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Marker for squad identifiers.
pub struct Squad;

/// Persistence collaborator: roster and catalog queries. Calls are
/// synchronous request/response and fallible; the engine does not retry.
#[async_trait]
pub trait RosterGateway: Send + Sync {
    /// Resolves a squad by (nickname, league).
    async fn find_squad(&self, nick: &str, league: &LeagueKey) -> anyhow::Result<Option<ID<Squad>>>;
    /// Whether the squad already holds this catalog entry.
    async fn roster_has_item(&self, squad: ID<Squad>, catalog: i64) -> anyhow::Result<bool>;
    /// Records a purchase on the squad's roster.
    async fn add_roster_item(&self, squad: ID<Squad>, lot: &Lot, price: Credits)
    -> anyhow::Result<()>;
    /// Catalog entries with the given role and source club that no squad in
    /// the league has purchased yet, excluding one catalog key.
    async fn other_unpurchased_in_role_from_club(
        &self,
        league: &LeagueKey,
        role: Role,
        club: &str,
        except: i64,
    ) -> anyhow::Result<Vec<Lot>>;
}

/// Budget/roster summary collaborator, recomputed league-wide after every
/// settlement.
#[async_trait]
pub trait SummaryGateway: Send + Sync {
    async fn league_summary(&self, league: &LeagueKey) -> anyhow::Result<LeagueSummary>;
}

/// One squad's budget line in a league summary.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SquadSummary {
    pub nickname: String,
    pub credits_left: Credits,
    /// Largest bid the squad can still afford while keeping one credit per
    /// unfilled slot.
    pub max_bid: Credits,
}

/// League-wide budget recap for broadcast.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LeagueSummary {
    pub squads: Vec<SquadSummary>,
}

/// A completed award, ready for broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct Settled {
    pub lot: Lot,
    pub winner: String,
    pub amount: Credits,
    /// Lots added at zero cost by the goalkeeper block cascade.
    pub cascade: Vec<Lot>,
}

/// Idempotent finalization. Runs only after the store's test-and-set
/// succeeded, so at most once per lot instance under concurrency; every
/// individual step re-checks existence so a crash-and-retry replay is safe.
pub struct Settler {
    roster: Arc<dyn RosterGateway>,
}

impl Settler {
    pub fn new(roster: Arc<dyn RosterGateway>) -> Self {
        Self { roster }
    }

    /// Awards the ticket. `Ok(None)` means a logged, non-fatal abort (no
    /// qualifying winner, or winner's squad unknown); the caller still
    /// clears the in-memory auction so the league returns to Idle.
    /// Collaborator errors propagate with the concluded latch left set:
    /// an operational alarm, not a retry path.
    pub async fn settle(
        &self,
        league: &LeagueKey,
        ticket: &SettlementTicket,
    ) -> anyhow::Result<Option<Settled>> {
        let Some(winner) = Self::qualify(ticket) else {
            log::warn!("[settle {}] no qualifying winner for {}", league, ticket.lot.name);
            return Ok(None);
        };
        let Some(squad) = self.roster.find_squad(winner, league).await? else {
            log::warn!("[settle {}] squad not found for nick {}", league, winner);
            return Ok(None);
        };
        if !self.roster.roster_has_item(squad, ticket.lot.catalog).await? {
            self.roster.add_roster_item(squad, &ticket.lot, ticket.bid).await?;
        }
        let cascade = self.cascade(league, squad, ticket).await?;
        log::info!(
            "[settle {}] {} -> {} for {} (+{} linked)",
            league,
            ticket.lot.name,
            winner,
            ticket.bid,
            cascade.len(),
        );
        Ok(Some(Settled {
            lot: ticket.lot.clone(),
            winner: winner.to_string(),
            amount: ticket.bid,
            cascade,
        }))
    }

    /// Numeric mode needs a leader with a positive bid; buzzer mode needs a
    /// claimant (the moderator-entered price rides in `bid`).
    fn qualify(ticket: &SettlementTicket) -> Option<&str> {
        match ticket.buzzer {
            true => ticket.leader.as_deref(),
            false => ticket.leader.as_deref().filter(|_| ticket.bid > 0),
        }
    }

    /// Goalkeeper block: every not-yet-purchased goalkeeper from the same
    /// source club joins the winner's roster at zero cost. De-duplicated by
    /// catalog key, so re-running adds only what is missing.
    async fn cascade(
        &self,
        league: &LeagueKey,
        squad: ID<Squad>,
        ticket: &SettlementTicket,
    ) -> anyhow::Result<Vec<Lot>> {
        if !ticket.goalkeeper_block || ticket.lot.role != Role::Goalkeeper {
            return Ok(Vec::new());
        }
        let mut added = Vec::new();
        let linked = self
            .roster
            .other_unpurchased_in_role_from_club(
                league,
                Role::Goalkeeper,
                &ticket.lot.club,
                ticket.lot.catalog,
            )
            .await?;
        for lot in linked {
            if self.roster.roster_has_item(squad, lot.catalog).await? {
                continue;
            }
            self.roster.add_roster_item(squad, &lot, 0).await?;
            added.push(lot);
        }
        Ok(added)
    }
}
