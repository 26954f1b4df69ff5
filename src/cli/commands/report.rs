//! Reconciliation report commands.

use chrono::NaiveDate;
use console::style;

use super::helpers::{open_db, parse_pair, require_submitter};
use super::SubmitterArgs;
use crate::config::Settings;
use crate::models::{today, DucReportDraft, FailedRound};
use crate::reports::{CageReturnSubmission, ReportService};

/// Print (and optionally save) the daily missort summary.
pub async fn cmd_report_missorts(
    settings: &Settings,
    date: Option<NaiveDate>,
    sub_depot: Option<i32>,
    save: bool,
    submitter: SubmitterArgs,
) -> anyhow::Result<()> {
    let service = ReportService::new(open_db(settings)?);
    let date = date.unwrap_or_else(today);

    let summary = if save {
        let report = service
            .save_missort_summary(date, sub_depot, require_submitter(submitter)?)
            .await?;
        println!(
            "{} Saved missort summary {} for {}",
            style("✓").green(),
            report.summary.key(),
            report.submitted_by.name
        );
        report.summary
    } else {
        service.missort_summary(date, sub_depot).await?
    };

    println!(
        "\n{} {}",
        style("Missort summary").bold(),
        summary.key()
    );
    println!("Total missorts: {}", style(summary.total_missorts).bold());
    if summary.total_missorts == 0 {
        return Ok(());
    }

    println!("\n{:<24} {:>6}", "Client", "Count");
    println!("{}", "-".repeat(31));
    for row in &summary.missorts_by_client {
        println!("{:<24} {:>6}", row.client_name, row.count);
    }

    println!("\n{:<18} {:<10} {:>6}", "Round", "Sub-depot", "Count");
    println!("{}", "-".repeat(36));
    for row in &summary.missorts_by_round {
        println!(
            "{:<18} {:<10} {:>6}",
            row.round_name, row.sub_depot_id, row.count
        );
    }
    Ok(())
}

/// Print the cage return sheet, or save it with the given non-returns.
pub async fn cmd_report_cage_return(
    settings: &Settings,
    date: Option<NaiveDate>,
    sub_depot: i32,
    not_returned: &[String],
    notes: Option<String>,
    save: bool,
    submitter: SubmitterArgs,
) -> anyhow::Result<()> {
    let service = ReportService::new(open_db(settings)?);
    let date = date.unwrap_or_else(today);

    if save {
        let non_returns = not_returned
            .iter()
            .map(|raw| parse_pair(raw))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let report = service
            .save_cage_return(CageReturnSubmission {
                date,
                sub_depot_id: sub_depot,
                non_returns,
                notes: notes.unwrap_or_default(),
                submitted_by: require_submitter(submitter)?,
            })
            .await?;
        println!(
            "{} Saved cage return {} with {} non-return(s)",
            style("✓").green(),
            report.key(),
            report.non_returns.len()
        );
    } else if !not_returned.is_empty() {
        println!(
            "{} --not-returned marks are only stored with --save",
            style("!").yellow()
        );
    }

    let sheet = service.open_cage_return(date, sub_depot).await?;
    println!(
        "\n{} {} / sub-depot {}{}",
        style("Cage return").bold(),
        sheet.date,
        sheet.sub_depot_id,
        if sheet.from_snapshot { " (saved)" } else { "" }
    );
    if sheet.lines.is_empty() {
        println!("No rounds with missing parcels");
        return Ok(());
    }
    for line in &sheet.lines {
        let mark = if line.not_returned {
            style("[x] not returned").red()
        } else {
            style("[ ] returned").green()
        };
        println!(
            "  {:<18} {:<20} {}",
            line.round_name, line.courier_name, mark
        );
    }
    if !sheet.notes.is_empty() {
        println!("Notes: {}", sheet.notes);
    }
    Ok(())
}

/// Import the missing-parcels summary for the DUC report, optionally
/// submitting the report with it.
pub async fn cmd_report_duc(
    settings: &Settings,
    date: Option<NaiveDate>,
    submit: bool,
    total_returns: u32,
    failed_rounds: &[i32],
    submitter: SubmitterArgs,
) -> anyhow::Result<()> {
    let service = ReportService::new(open_db(settings)?);
    let date = date.unwrap_or_else(today);

    let summary = service.import_missing_summary(date).await?;
    println!("\n{} {}", style("Missing parcels").bold(), date);
    println!("  {:<14} {}", "Missing", summary.total_missing);
    println!("  {:<14} {}", "Unrecovered", summary.unrecovered);
    println!("  {:<14} {}%", "Recovery rate", summary.recovery_rate);

    if !submit {
        return Ok(());
    }

    let mut draft = DucReportDraft::new(date);
    draft.total_returns = total_returns;
    draft.failed_rounds = failed_rounds
        .iter()
        .map(|&round_id| FailedRound {
            round_id,
            reason: String::new(),
        })
        .collect();
    draft.missing_summary = Some(summary);

    let report = service
        .submit_duc(&draft, require_submitter(submitter)?)
        .await?;
    println!(
        "{} Submitted DUC report {} as {}",
        style("✓").green(),
        report.key(),
        report.submitted_by.name
    );
    Ok(())
}
