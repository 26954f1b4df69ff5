//! Read-only reference registries.
//!
//! Each list is fetched independently; [`DieselRegistryRepository::snapshot`]
//! joins them in memory. The only write path is a bulk import of the lists
//! exported by the system that owns them.

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::info;

use super::diesel_models::{
    ClientRecord, CourierRecord, DeliveryUnitRecord, RoundRecord, SubDepotRecord,
    TeamMemberRecord,
};
use super::pool::{DbPool, DieselError};
use crate::models::{
    Client, Courier, DeliveryUnit, RegistryImport, RegistrySnapshot, Round, SubDepot, TeamMember,
};
use crate::schema::{clients, couriers, delivery_units, rounds, sub_depots, team_members};
use crate::with_conn;

impl From<ClientRecord> for Client {
    fn from(r: ClientRecord) -> Self {
        Client {
            id: r.id,
            name: r.name,
            is_high_priority: r.is_high_priority,
            tracking_carrier: r.tracking_carrier,
        }
    }
}

impl From<&Client> for ClientRecord {
    fn from(c: &Client) -> Self {
        ClientRecord {
            id: c.id,
            name: c.name.clone(),
            is_high_priority: c.is_high_priority,
            tracking_carrier: c.tracking_carrier.clone(),
        }
    }
}

impl From<CourierRecord> for Courier {
    fn from(r: CourierRecord) -> Self {
        Courier {
            id: r.id,
            name: r.name,
            is_active: r.is_active,
        }
    }
}

impl From<RoundRecord> for Round {
    fn from(r: RoundRecord) -> Self {
        Round {
            id: r.id,
            name: r.name,
            sub_depot_id: r.sub_depot_id,
        }
    }
}

impl From<SubDepotRecord> for SubDepot {
    fn from(r: SubDepotRecord) -> Self {
        SubDepot {
            id: r.id,
            name: r.name,
            delivery_unit_id: r.delivery_unit_id,
        }
    }
}

impl From<TeamMemberRecord> for TeamMember {
    fn from(r: TeamMemberRecord) -> Self {
        TeamMember {
            id: r.id,
            name: r.name,
            role: r.role,
        }
    }
}

impl From<DeliveryUnitRecord> for DeliveryUnit {
    fn from(r: DeliveryUnitRecord) -> Self {
        DeliveryUnit {
            id: r.id,
            name: r.name,
        }
    }
}

/// Row counts written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub clients: usize,
    pub couriers: usize,
    pub rounds: usize,
    pub sub_depots: usize,
    pub team_members: usize,
    pub delivery_units: usize,
}

impl ImportCounts {
    pub fn total(&self) -> usize {
        self.clients
            + self.couriers
            + self.rounds
            + self.sub_depots
            + self.team_members
            + self.delivery_units
    }
}

/// Diesel-based registry repository.
#[derive(Clone)]
pub struct DieselRegistryRepository {
    pool: DbPool,
}

impl DieselRegistryRepository {
    /// Create a new repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn clients(&self) -> Result<Vec<Client>, DieselError> {
        with_conn!(self.pool, conn => {
            clients::table
                .order(clients::id.asc())
                .select(ClientRecord::as_select())
                .load(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(Client::from).collect())
        })
    }

    pub async fn client(&self, id: i32) -> Result<Option<Client>, DieselError> {
        with_conn!(self.pool, conn => {
            clients::table
                .find(id)
                .select(ClientRecord::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(Client::from))
        })
    }

    pub async fn couriers(&self) -> Result<Vec<Courier>, DieselError> {
        with_conn!(self.pool, conn => {
            couriers::table
                .order(couriers::id.asc())
                .select(CourierRecord::as_select())
                .load(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(Courier::from).collect())
        })
    }

    pub async fn rounds(&self) -> Result<Vec<Round>, DieselError> {
        with_conn!(self.pool, conn => {
            rounds::table
                .order(rounds::id.asc())
                .select(RoundRecord::as_select())
                .load(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(Round::from).collect())
        })
    }

    pub async fn sub_depots(&self) -> Result<Vec<SubDepot>, DieselError> {
        with_conn!(self.pool, conn => {
            sub_depots::table
                .order(sub_depots::id.asc())
                .select(SubDepotRecord::as_select())
                .load(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(SubDepot::from).collect())
        })
    }

    pub async fn team_members(&self) -> Result<Vec<TeamMember>, DieselError> {
        with_conn!(self.pool, conn => {
            team_members::table
                .order(team_members::id.asc())
                .select(TeamMemberRecord::as_select())
                .load(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(TeamMember::from).collect())
        })
    }

    pub async fn delivery_units(&self) -> Result<Vec<DeliveryUnit>, DieselError> {
        with_conn!(self.pool, conn => {
            delivery_units::table
                .order(delivery_units::id.asc())
                .select(DeliveryUnitRecord::as_select())
                .load(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(DeliveryUnit::from).collect())
        })
    }

    /// Fetch every list and join them by primary key.
    pub async fn snapshot(&self) -> Result<RegistrySnapshot, DieselError> {
        let (clients, couriers, rounds, sub_depots, team_members, delivery_units) = tokio::try_join!(
            self.clients(),
            self.couriers(),
            self.rounds(),
            self.sub_depots(),
            self.team_members(),
            self.delivery_units(),
        )?;

        Ok(RegistrySnapshot::from_lists(RegistryImport {
            clients,
            couriers,
            rounds,
            sub_depots,
            team_members,
            delivery_units,
        }))
    }

    /// Upsert every row of an upstream export.
    pub async fn import(&self, lists: &RegistryImport) -> Result<ImportCounts, DieselError> {
        let client_rows: Vec<ClientRecord> = lists.clients.iter().map(ClientRecord::from).collect();
        let courier_rows: Vec<CourierRecord> = lists
            .couriers
            .iter()
            .map(|c| CourierRecord {
                id: c.id.clone(),
                name: c.name.clone(),
                is_active: c.is_active,
            })
            .collect();
        let round_rows: Vec<RoundRecord> = lists
            .rounds
            .iter()
            .map(|r| RoundRecord {
                id: r.id,
                name: r.name.clone(),
                sub_depot_id: r.sub_depot_id,
            })
            .collect();
        let sub_depot_rows: Vec<SubDepotRecord> = lists
            .sub_depots
            .iter()
            .map(|s| SubDepotRecord {
                id: s.id,
                name: s.name.clone(),
                delivery_unit_id: s.delivery_unit_id,
            })
            .collect();
        let team_rows: Vec<TeamMemberRecord> = lists
            .team_members
            .iter()
            .map(|t| TeamMemberRecord {
                id: t.id,
                name: t.name.clone(),
                role: t.role.clone(),
            })
            .collect();
        let du_rows: Vec<DeliveryUnitRecord> = lists
            .delivery_units
            .iter()
            .map(|d| DeliveryUnitRecord {
                id: d.id,
                name: d.name.clone(),
            })
            .collect();

        // One transaction so a failed row leaves the registries as they were
        let counts = with_conn!(self.pool, conn => {
            conn.transaction(|conn| {
                Box::pin(async move {
                    let mut counts = ImportCounts::default();
                    // Use replace_into for SQLite upsert
                    for row in &client_rows {
                        counts.clients += diesel::replace_into(clients::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &courier_rows {
                        counts.couriers += diesel::replace_into(couriers::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &round_rows {
                        counts.rounds += diesel::replace_into(rounds::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &sub_depot_rows {
                        counts.sub_depots += diesel::replace_into(sub_depots::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &team_rows {
                        counts.team_members += diesel::replace_into(team_members::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    for row in &du_rows {
                        counts.delivery_units += diesel::replace_into(delivery_units::table)
                            .values(row)
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, DieselError>(counts)
                })
            })
            .await?
        });

        info!("Imported {} registry rows", counts.total());
        Ok(counts)
    }
}
