use super::*;
use asta_auction::LeagueSummary;
use asta_auction::SquadSummary;
use asta_auction::SummaryGateway;
use asta_core::Credits;
use asta_core::LeagueKey;
use async_trait::async_trait;

/// [`SummaryGateway`] over PostgreSQL. Aggregates spend and roster fill in
/// one query; the max-bid formula runs here so SQL stays arithmetic-free.
pub struct PgSummary {
    db: Arc<Client>,
}

impl PgSummary {
    pub fn new(db: Arc<Client>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SummaryGateway for PgSummary {
    async fn league_summary(&self, league: &LeagueKey) -> anyhow::Result<LeagueSummary> {
        let rows = self
            .db
            .query(
                const_format::concatcp!(
                    "SELECT s.nickname, s.credits,",
                    " COALESCE(SUM(r.price), 0)::INT, COUNT(r.catalog)::INT, l.slots FROM ",
                    SQUADS,
                    " s JOIN ",
                    LEAGUES,
                    " l ON s.league_id = l.id LEFT JOIN ",
                    ROSTERS,
                    " r ON r.squad_id = s.id",
                    " WHERE l.alias = $1",
                    " GROUP BY s.id, s.nickname, s.credits, l.slots",
                    " ORDER BY s.nickname"
                ),
                &[&league.as_str()],
            )
            .await?;
        let squads = rows
            .iter()
            .map(|row| {
                let credits_left = row.get::<_, i32>(1) - row.get::<_, i32>(2);
                let slots_left = row.get::<_, i16>(4) as i32 - row.get::<_, i32>(3);
                SquadSummary {
                    nickname: row.get::<_, String>(0),
                    credits_left,
                    max_bid: max_bid(credits_left, slots_left),
                }
            })
            .collect();
        Ok(LeagueSummary { squads })
    }
}

/// Largest bid a squad can place while reserving one credit per remaining
/// unfilled slot (the slot being bid on excluded). Floored at zero.
pub(crate) fn max_bid(credits_left: Credits, slots_left: i32) -> Credits {
    (credits_left - (slots_left - 1).max(0)).max(0)
}
