//! Registry commands.

use std::path::Path;

use console::style;

use super::helpers::open_db;
use crate::config::Settings;
use crate::models::RegistryImport;

/// Load registry lists from a JSON export.
pub async fn cmd_registry_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let import: RegistryImport = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Invalid registry export {}: {}", file.display(), e))?;

    let ctx = open_db(settings)?;
    let counts = ctx.registries().import(&import).await?;

    if counts.total() == 0 {
        println!("{} {} holds no registry rows", style("!").yellow(), file.display());
        return Ok(());
    }

    println!("{} Imported registries from {}", style("✓").green(), file.display());
    println!("  {:<16} {}", "Clients", counts.clients);
    println!("  {:<16} {}", "Couriers", counts.couriers);
    println!("  {:<16} {}", "Rounds", counts.rounds);
    println!("  {:<16} {}", "Sub-depots", counts.sub_depots);
    println!("  {:<16} {}", "Team members", counts.team_members);
    println!("  {:<16} {}", "Delivery units", counts.delivery_units);
    Ok(())
}

/// Print registry sizes and the high-priority clients.
pub async fn cmd_registry_show(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings)?;
    let registry = ctx.registries().snapshot().await?;

    println!("\n{}", style("Registries").bold());
    println!("{}", "-".repeat(30));
    println!("  {:<16} {}", "Clients", registry.clients.len());
    println!("  {:<16} {}", "Couriers", registry.couriers.len());
    println!("  {:<16} {}", "Rounds", registry.rounds.len());
    println!("  {:<16} {}", "Sub-depots", registry.sub_depots.len());
    println!("  {:<16} {}", "Team members", registry.team_members.len());
    println!("  {:<16} {}", "Delivery units", registry.delivery_units.len());

    let mut high_priority: Vec<&str> = registry
        .clients
        .values()
        .filter(|c| c.is_high_priority)
        .map(|c| c.name.as_str())
        .collect();
    if !high_priority.is_empty() {
        high_priority.sort_unstable();
        println!(
            "\n{} {}",
            style("High-priority clients:").bold(),
            high_priority.join(", ")
        );
    }
    Ok(())
}
