//! Daily missort summary.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{
    CageAuditMissort, ClientMissortCount, MissortSummary, RegistrySnapshot, RoundMissortCount,
};

/// Group one day's audit lines by client and by (round, sub-depot).
///
/// Each grouping is ranked by descending count; ties keep the order in which
/// the groups were first seen.
pub fn compute(
    date: NaiveDate,
    sub_depot_id: Option<i32>,
    missorts: &[CageAuditMissort],
    registry: &RegistrySnapshot,
) -> MissortSummary {
    let in_scope = missorts.iter().filter(|m| {
        m.audit_date == date && sub_depot_id.map_or(true, |sd| m.sub_depot_id == sd)
    });

    let mut total = 0u32;
    let mut by_client: Vec<(i32, u32)> = Vec::new();
    let mut client_index: HashMap<i32, usize> = HashMap::new();
    let mut by_round: Vec<((i32, i32), u32)> = Vec::new();
    let mut round_index: HashMap<(i32, i32), usize> = HashMap::new();

    for m in in_scope {
        total = total.saturating_add(m.quantity);
        bump(&mut by_client, &mut client_index, m.client_id, m.quantity);
        bump(
            &mut by_round,
            &mut round_index,
            (m.round_id, m.sub_depot_id),
            m.quantity,
        );
    }

    // sort_by is stable, so equal counts stay in encounter order
    by_client.sort_by(|a, b| b.1.cmp(&a.1));
    by_round.sort_by(|a, b| b.1.cmp(&a.1));

    MissortSummary {
        date,
        sub_depot_id,
        total_missorts: total,
        missorts_by_client: by_client
            .into_iter()
            .map(|(client_id, count)| ClientMissortCount {
                client_id,
                client_name: registry.client_name(client_id),
                count,
            })
            .collect(),
        missorts_by_round: by_round
            .into_iter()
            .map(|((round_id, sd), count)| RoundMissortCount {
                round_id,
                round_name: registry.round_name(round_id),
                sub_depot_id: sd,
                count,
            })
            .collect(),
    }
}

fn bump<K: std::hash::Hash + Eq + Copy>(
    groups: &mut Vec<(K, u32)>,
    index: &mut HashMap<K, usize>,
    key: K,
    quantity: u32,
) {
    match index.get(&key) {
        Some(&i) => groups[i].1 = groups[i].1.saturating_add(quantity),
        None => {
            index.insert(key, groups.len());
            groups.push((key, quantity));
        }
    }
}
