//! Shared helper functions for CLI commands.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use console::style;

use super::SubmitterArgs;
use crate::config::Settings;
use crate::ledger::{LedgerBackend, ParcelLedger};
use crate::models::{ParcelScanEntry, RegistrySnapshot, RoundCourierPair, Submitter};
use crate::repository::DbContext;
use crate::workflow::ParcelWorkflow;

/// Open the database, failing with a hint when it has not been initialized.
pub fn open_db(settings: &Settings) -> anyhow::Result<DbContext> {
    if !settings.database_exists() {
        anyhow::bail!(
            "No database at {}. Run 'depot init' first.",
            settings.database_path().display()
        );
    }
    Ok(settings.create_db_context())
}

/// Build a workflow over the stored ledger and registries.
pub async fn open_workflow(settings: &Settings) -> anyhow::Result<(DbContext, ParcelWorkflow)> {
    let ctx = open_db(settings)?;
    let registry = Arc::new(ctx.registries().snapshot().await?);
    let backend: Arc<dyn LedgerBackend> = Arc::new(ctx.parcels());
    let ledger = ParcelLedger::open(backend, registry).await?;
    let workflow = ParcelWorkflow::with_questions(ledger, settings.checklist_questions.clone());
    Ok((ctx, workflow))
}

/// Truncate a string for table display.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Ask a question on the terminal and return the trimmed reply, or `None`
/// once stdin is closed.
pub fn prompt(question: &str) -> io::Result<Option<String>> {
    print!("{} ", question);
    io::stdout().flush()?;
    read_reply(&mut io::stdin().lock())
}

fn read_reply(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// Parse `ROUND:COURIER`.
pub fn parse_pair(raw: &str) -> anyhow::Result<RoundCourierPair> {
    let (round, courier) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Expected ROUND:COURIER, got '{}'", raw))?;
    let round_id: i32 = round
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid round '{}'", round))?;
    Ok(RoundCourierPair::new(round_id, courier.trim()))
}

/// Resolve the submitter from flags or environment.
pub fn require_submitter(args: SubmitterArgs) -> anyhow::Result<Submitter> {
    match (args.id, args.name) {
        (Some(id), Some(name)) => Ok(Submitter { id, name }),
        _ => anyhow::bail!(
            "Saving a report needs --submitter-id and --submitter-name (or DEPOT_SUBMITTER_ID / DEPOT_SUBMITTER_NAME)"
        ),
    }
}

pub fn print_parcel_table<'a>(
    entries: impl IntoIterator<Item = &'a ParcelScanEntry>,
    registry: &RegistrySnapshot,
) {
    println!(
        "{:<6} {:<18} {:<10} {:<14} {:<8} {:<16} {:<13} Status",
        "ID", "Barcode", "Date", "Round", "Courier", "Client", "Scan"
    );
    println!("{}", "-".repeat(100));
    for entry in entries {
        let status = match entry.recovery_date {
            Some(date) => style(format!("recovered {}", date)).green(),
            None => style("missing".to_string()).red(),
        };
        println!(
            "{:<6} {:<18} {:<10} {:<14} {:<8} {:<16} {:<13} {}",
            entry.id,
            entry.barcode,
            entry.date_added,
            truncate(&registry.round_name(entry.round_id), 13),
            entry.courier_id,
            truncate(&registry.client_name(entry.client_id), 15),
            entry.scan_type.as_str(),
            status
        );
    }
}
