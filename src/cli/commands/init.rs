//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let registry = ctx.registries().snapshot().await?;
    if registry.is_empty() {
        println!("{} No registries loaded yet", style("!").yellow());
        println!("  Run 'depot registry import <file>' with the depot's registry export");
    }

    match settings.tracking_base_url {
        Some(ref url) => println!("  {} Carrier tracking via {}", style("✓").green(), url),
        None => println!(
            "  {} Carrier tracking disabled (set tracking.base_url to enable)",
            style("-").dim()
        ),
    }

    println!(
        "{} Initialized depot ledger in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
