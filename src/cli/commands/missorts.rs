//! Cage audit missort commands.

use console::style;

use super::helpers::open_db;
use crate::config::Settings;
use crate::models::NewCageAuditMissort;

pub async fn cmd_missorts_add(settings: &Settings, missort: NewCageAuditMissort) -> anyhow::Result<()> {
    if missort.sub_depot_id <= 0 || missort.round_id <= 0 || missort.client_id <= 0 {
        anyhow::bail!("--sub-depot, --round and --client must be positive IDs");
    }

    let ctx = open_db(settings)?;
    let registry = ctx.registries().snapshot().await?;
    let stored = ctx.missorts().add(&missort).await?;

    println!(
        "{} Recorded {} missort(s) for {} on {} ({})",
        style("✓").green(),
        stored.quantity,
        registry.client_name(stored.client_id),
        registry.round_name(stored.round_id),
        stored.audit_date
    );
    Ok(())
}
