use super::*;
use asta_auction::Lot;
use asta_auction::RosterGateway;
use asta_auction::Squad;
use asta_core::Credits;
use asta_core::ID;
use asta_core::LeagueKey;
use asta_core::Role;
use async_trait::async_trait;

/// [`RosterGateway`] over PostgreSQL. Writes are conflict-tolerant so a
/// settlement replay never double-inserts.
pub struct PgRoster {
    db: Arc<Client>,
}

impl PgRoster {
    pub fn new(db: Arc<Client>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RosterGateway for PgRoster {
    async fn find_squad(&self, nick: &str, league: &LeagueKey) -> anyhow::Result<Option<ID<Squad>>> {
        let row = self
            .db
            .query_opt(
                const_format::concatcp!(
                    "SELECT s.id FROM ",
                    SQUADS,
                    " s JOIN ",
                    LEAGUES,
                    " l ON s.league_id = l.id WHERE s.nickname = $1 AND l.alias = $2"
                ),
                &[&nick, &league.as_str()],
            )
            .await?;
        Ok(row.map(|row| ID::from(row.get::<_, uuid::Uuid>(0))))
    }

    async fn roster_has_item(&self, squad: ID<Squad>, catalog: i64) -> anyhow::Result<bool> {
        let row = self
            .db
            .query_opt(
                const_format::concatcp!(
                    "SELECT 1 FROM ",
                    ROSTERS,
                    " WHERE squad_id = $1 AND catalog = $2"
                ),
                &[&squad.inner(), &catalog],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn add_roster_item(
        &self,
        squad: ID<Squad>,
        lot: &Lot,
        price: Credits,
    ) -> anyhow::Result<()> {
        self.db
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    ROSTERS,
                    " (squad_id, catalog, name, role, alt_role, club, price)",
                    " VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    " ON CONFLICT (squad_id, catalog) DO NOTHING"
                ),
                &[
                    &squad.inner(),
                    &lot.catalog,
                    &lot.name,
                    &lot.role.code(),
                    &lot.alt_role,
                    &lot.club,
                    &price,
                ],
            )
            .await?;
        Ok(())
    }

    async fn other_unpurchased_in_role_from_club(
        &self,
        league: &LeagueKey,
        role: Role,
        club: &str,
        except: i64,
    ) -> anyhow::Result<Vec<Lot>> {
        let rows = self
            .db
            .query(
                const_format::concatcp!(
                    "SELECT c.catalog, c.name, c.role, c.alt_role, c.club FROM ",
                    CATALOG,
                    " c JOIN ",
                    LEAGUES,
                    " l ON c.league_id = l.id",
                    " WHERE l.alias = $1 AND c.role = $2 AND c.club = $3 AND c.catalog <> $4",
                    " AND NOT EXISTS (SELECT 1 FROM ",
                    ROSTERS,
                    " r JOIN ",
                    SQUADS,
                    " s ON r.squad_id = s.id",
                    " WHERE s.league_id = l.id AND r.catalog = c.catalog)",
                    " ORDER BY c.catalog"
                ),
                &[&league.as_str(), &role.code(), &club, &except],
            )
            .await?;
        let mut lots = Vec::with_capacity(rows.len());
        for row in rows {
            lots.push(Lot {
                catalog: row.get::<_, i64>(0),
                name: row.get::<_, String>(1),
                role: row.get::<_, String>(2).parse().map_err(anyhow::Error::msg)?,
                alt_role: row.get::<_, Option<String>>(3),
                club: row.get::<_, String>(4),
            });
        }
        Ok(lots)
    }
}
