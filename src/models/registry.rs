//! Reference registries owned by the wider depot system.
//!
//! The ledger only reads these lists; they are fetched independently and
//! joined in memory by primary key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i32,
    pub name: String,
    /// Parcels for this client must pass the escalation checklist before
    /// they can be logged as missing.
    #[serde(default)]
    pub is_high_priority: bool,
    /// Carrier code used for tracking lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_carrier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Courier {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: i32,
    pub name: String,
    pub sub_depot_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDepot {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_unit_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryUnit {
    pub id: i32,
    pub name: String,
}

fn default_true() -> bool {
    true
}

/// Bulk registry export as produced by the upstream system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryImport {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub couriers: Vec<Courier>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub sub_depots: Vec<SubDepot>,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default)]
    pub delivery_units: Vec<DeliveryUnit>,
}

/// In-memory join of every registry list, keyed by primary key.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub clients: HashMap<i32, Client>,
    pub couriers: HashMap<String, Courier>,
    pub rounds: HashMap<i32, Round>,
    pub sub_depots: HashMap<i32, SubDepot>,
    pub team_members: HashMap<i32, TeamMember>,
    pub delivery_units: HashMap<i32, DeliveryUnit>,
}

impl RegistrySnapshot {
    pub fn from_lists(lists: RegistryImport) -> Self {
        Self {
            clients: lists.clients.into_iter().map(|c| (c.id, c)).collect(),
            couriers: lists
                .couriers
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            rounds: lists.rounds.into_iter().map(|r| (r.id, r)).collect(),
            sub_depots: lists.sub_depots.into_iter().map(|s| (s.id, s)).collect(),
            team_members: lists.team_members.into_iter().map(|t| (t.id, t)).collect(),
            delivery_units: lists
                .delivery_units
                .into_iter()
                .map(|d| (d.id, d))
                .collect(),
        }
    }

    pub fn client(&self, id: i32) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Unknown clients are treated as ordinary clients.
    pub fn is_high_priority(&self, client_id: i32) -> bool {
        self.clients
            .get(&client_id)
            .is_some_and(|c| c.is_high_priority)
    }

    pub fn client_name(&self, id: i32) -> String {
        self.clients
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Unknown client #{}", id))
    }

    pub fn round_name(&self, id: i32) -> String {
        self.rounds
            .get(&id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("Round #{}", id))
    }

    pub fn sub_depot_name(&self, id: i32) -> String {
        self.sub_depots
            .get(&id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Sub-depot #{}", id))
    }

    pub fn courier_name(&self, id: &str) -> String {
        self.couriers
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
            && self.couriers.is_empty()
            && self.rounds.is_empty()
            && self.sub_depots.is_empty()
            && self.team_members.is_empty()
            && self.delivery_units.is_empty()
    }
}
