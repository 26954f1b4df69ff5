//! Missing-parcel commands.

use std::path::PathBuf;

use chrono::NaiveDate;
use console::style;

use super::helpers::{open_workflow, print_parcel_table, prompt};
use crate::config::Settings;
use crate::escalation::ChecklistAnswer;
use crate::models::{NewParcelEntry, ScanType};
use crate::workflow::{ParcelWorkflow, WorkflowOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ScanKind {
    #[default]
    Standard,
    Misrouted,
    Rejected,
    CarryForward,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// JSON file with an array of parcels (overrides the single-parcel flags)
    #[arg(long, conflicts_with = "barcode")]
    file: Option<PathBuf>,
    /// 16-character parcel barcode
    #[arg(long, required_unless_present = "file")]
    barcode: Option<String>,
    #[arg(long, default_value = "0")]
    round: i32,
    #[arg(long, default_value = "0")]
    drop: i32,
    #[arg(long, default_value = "0")]
    sub_depot: i32,
    #[arg(long, default_value = "")]
    courier: String,
    /// Team member who sorted the parcel
    #[arg(long, default_value = "0")]
    sorter: i32,
    #[arg(long, default_value = "0")]
    client: i32,
    #[arg(long, value_enum, default_value = "standard")]
    scan_type: ScanKind,
    /// Delivery unit for misrouted parcels
    #[arg(long)]
    delivery_unit: Option<i32>,
    /// Courier for rejected or carried-forward parcels
    #[arg(long)]
    scan_courier: Option<String>,
    /// Log the parcel as already recovered
    #[arg(long)]
    recovered: bool,
    /// Day the parcel belongs to (default: today)
    #[arg(short, long)]
    date: Option<NaiveDate>,
}

impl AddArgs {
    fn scan_type(&self) -> ScanType {
        let courier_id = self.scan_courier.clone().unwrap_or_default();
        match self.scan_type {
            ScanKind::Standard => ScanType::Standard,
            ScanKind::Misrouted => ScanType::Misrouted {
                delivery_unit_id: self.delivery_unit.unwrap_or(0),
            },
            ScanKind::Rejected => ScanType::Rejected { courier_id },
            ScanKind::CarryForward => ScanType::CarryForward { courier_id },
        }
    }

    async fn candidates(&self) -> anyhow::Result<Vec<NewParcelEntry>> {
        if let Some(ref file) = self.file {
            let contents = tokio::fs::read_to_string(file).await?;
            return serde_json::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("Invalid parcel batch {}: {}", file.display(), e));
        }

        Ok(vec![NewParcelEntry {
            barcode: self.barcode.clone().unwrap_or_default(),
            round_id: self.round,
            drop_number: self.drop,
            sub_depot_id: self.sub_depot,
            courier_id: self.courier.clone(),
            sorter_team_member_id: self.sorter,
            client_id: self.client,
            time_scanned: None,
            scan_type: self.scan_type(),
            recovered: self.recovered,
            date_added: self.date,
        }])
    }
}

/// List ledger entries.
pub async fn cmd_parcels_list(
    settings: &Settings,
    date: Option<NaiveDate>,
    sub_depot: Option<i32>,
    unrecovered: bool,
) -> anyhow::Result<()> {
    let (_ctx, workflow) = open_workflow(settings).await?;
    let ledger = workflow.ledger();

    let entries: Vec<_> = ledger
        .entries()
        .filter(|e| date.map_or(true, |d| e.date_added == d))
        .filter(|e| sub_depot.map_or(true, |sd| e.sub_depot_id == sd))
        .filter(|e| !unrecovered || !e.is_recovered())
        .collect();

    if entries.is_empty() {
        println!("{} No missing parcels found", style("!").yellow());
        return Ok(());
    }

    print_parcel_table(entries.iter().copied(), workflow.registry());
    let missing = entries.iter().filter(|e| !e.is_recovered()).count();
    println!(
        "\n{} parcel(s), {} still missing",
        style(entries.len()).bold(),
        style(missing).red()
    );
    Ok(())
}

/// Log parcels, walking the escalation checklist on the terminal if it opens.
pub async fn cmd_parcels_add(settings: &Settings, args: AddArgs) -> anyhow::Result<()> {
    let candidates = args.candidates().await?;
    let (_ctx, mut workflow) = open_workflow(settings).await?;

    let mut outcome = workflow.submit_append(candidates).await?;
    loop {
        match outcome {
            WorkflowOutcome::ChecklistPending(_) => {
                outcome = ask_next(&mut workflow).await?;
            }
            WorkflowOutcome::ChecklistAborted => {
                println!("{} Checklist closed; nothing was logged", style("!").yellow());
                return Ok(());
            }
            WorkflowOutcome::Appended(result) => {
                if result.persisted.is_empty() {
                    println!(
                        "{} No valid parcels to log ({} skipped, run with -v for reasons)",
                        style("✗").red(),
                        result.skipped
                    );
                    return Ok(());
                }
                for entry in &result.persisted {
                    println!(
                        "  {} Logged {} (id {})",
                        style("✓").green(),
                        entry.barcode,
                        entry.id
                    );
                }
                if result.skipped > 0 {
                    println!(
                        "  {} Skipped {} invalid parcel(s)",
                        style("!").yellow(),
                        result.skipped
                    );
                }
                return Ok(());
            }
            WorkflowOutcome::Edited(entry) => {
                println!("  {} Updated {}", style("✓").green(), entry.barcode);
                return Ok(());
            }
        }
    }
}

/// Show the current question and feed the operator's answer back.
async fn ask_next(workflow: &mut ParcelWorkflow) -> anyhow::Result<WorkflowOutcome> {
    let Some(view) = workflow.view() else {
        return Ok(WorkflowOutcome::ChecklistAborted);
    };

    if view.step == 0 && view.alert.is_none() {
        println!(
            "\n{} High-priority client: answer the safety checklist to {}",
            style("!").yellow().bold(),
            view.pending
        );
    }
    if let Some(ref alert) = view.alert {
        println!("  {} {}", style("✗").red(), style(alert).red());
    }

    let question = view.question.unwrap_or_default();
    loop {
        let reply = prompt(&format!(
            "[{}/{}] {} [y/n/q]",
            view.step + 1,
            view.total,
            question
        ))?;
        match interpret_reply(reply.as_deref()) {
            Reply::Answer(answer) => return Ok(workflow.answer(answer).await?),
            Reply::Quit => return Ok(workflow.cancel()?),
            Reply::Unclear => println!("  Please answer y, n or q"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Answer(ChecklistAnswer),
    Quit,
    Unclear,
}

/// Closed stdin counts as `q` so piped input cannot loop forever.
fn interpret_reply(reply: Option<&str>) -> Reply {
    match reply {
        None => Reply::Quit,
        Some(r) if r.eq_ignore_ascii_case("q") => Reply::Quit,
        Some(r) => r.parse().map_or(Reply::Unclear, Reply::Answer),
    }
}

/// Flip recovery state. Never gated by the checklist.
pub async fn cmd_parcels_set_recovered(
    settings: &Settings,
    id: i32,
    recovered: bool,
) -> anyhow::Result<()> {
    let (_ctx, mut workflow) = open_workflow(settings).await?;
    let entry = workflow.set_recovered(id, recovered).await?;

    match entry.recovery_date {
        Some(date) => println!(
            "{} {} marked recovered on {}",
            style("✓").green(),
            entry.barcode,
            date
        ),
        None => println!(
            "{} {} marked missing again",
            style("!").yellow(),
            entry.barcode
        ),
    }
    Ok(())
}
