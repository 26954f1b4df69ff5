//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod helpers;
mod init;
mod missorts;
mod parcels;
mod registry;
mod report;
mod serve;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "Missing-parcel ledger and daily reconciliation for delivery depots")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing depot-ledger.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3030)
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// Manage reference registries
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },

    /// Log and manage missing parcels
    Parcels {
        #[command(subcommand)]
        command: ParcelCommands,
    },

    /// Record cage audit missorts
    Missorts {
        #[command(subcommand)]
        command: MissortCommands,
    },

    /// Daily reconciliation reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// Import registry lists from a JSON export
    Import {
        /// JSON file with clients, couriers, rounds, sub_depots, team_members
        /// and delivery_units lists
        file: PathBuf,
    },
    /// Show how many rows each registry holds
    Show,
}

/// Who is submitting a report.
#[derive(clap::Args, Debug, Clone)]
pub struct SubmitterArgs {
    /// Submitter team member ID
    #[arg(long = "submitter-id", env = "DEPOT_SUBMITTER_ID")]
    pub id: Option<i32>,
    /// Submitter name
    #[arg(long = "submitter-name", env = "DEPOT_SUBMITTER_NAME")]
    pub name: Option<String>,
}

#[derive(Subcommand)]
enum ParcelCommands {
    /// List logged parcels
    List {
        /// Day to list (default: all days)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Restrict to one sub-depot
        #[arg(short, long)]
        sub_depot: Option<i32>,
        /// Only show parcels that are still missing
        #[arg(short, long)]
        unrecovered: bool,
    },
    /// Log missing parcels, one from flags or a batch from a JSON file
    Add(parcels::AddArgs),
    /// Mark a parcel as recovered
    Recover {
        /// Parcel ID
        id: i32,
    },
    /// Mark a recovered parcel as missing again
    Missing {
        /// Parcel ID
        id: i32,
    },
}

#[derive(Subcommand)]
enum MissortCommands {
    /// Record a missort found during the cage audit
    Add {
        /// Audit day (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        sub_depot: i32,
        #[arg(long)]
        round: i32,
        #[arg(long)]
        client: i32,
        /// Number of parcels
        #[arg(short, long, default_value = "1")]
        quantity: u32,
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Daily missort summary by client and round
    Missorts {
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        sub_depot: Option<i32>,
        /// Save the summary as a snapshot
        #[arg(long)]
        save: bool,
        #[command(flatten)]
        submitter: SubmitterArgs,
    },
    /// Cage return sheet for one sub-depot
    CageReturn {
        #[arg(short, long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        sub_depot: i32,
        /// Mark a cage as not returned, as ROUND:COURIER (repeatable)
        #[arg(long = "not-returned", value_name = "ROUND:COURIER")]
        not_returned: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Save the sheet with the given marks
        #[arg(long)]
        save: bool,
        #[command(flatten)]
        submitter: SubmitterArgs,
    },
    /// Missing-parcels section of the DUC report
    DucSummary {
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Submit the DUC report with the imported summary
        #[arg(long)]
        submit: bool,
        /// Total returns for the day
        #[arg(long, default_value = "0")]
        total_returns: u32,
        /// Failed round IDs (repeatable)
        #[arg(long = "failed-round")]
        failed_rounds: Vec<i32>,
        #[command(flatten)]
        submitter: SubmitterArgs,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        target: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Registry { command } => match command {
            RegistryCommands::Import { file } => {
                registry::cmd_registry_import(&settings, &file).await
            }
            RegistryCommands::Show => registry::cmd_registry_show(&settings).await,
        },
        Commands::Parcels { command } => match command {
            ParcelCommands::List {
                date,
                sub_depot,
                unrecovered,
            } => parcels::cmd_parcels_list(&settings, date, sub_depot, unrecovered).await,
            ParcelCommands::Add(args) => parcels::cmd_parcels_add(&settings, args).await,
            ParcelCommands::Recover { id } => {
                parcels::cmd_parcels_set_recovered(&settings, id, true).await
            }
            ParcelCommands::Missing { id } => {
                parcels::cmd_parcels_set_recovered(&settings, id, false).await
            }
        },
        Commands::Missorts { command } => match command {
            MissortCommands::Add {
                date,
                sub_depot,
                round,
                client,
                quantity,
                barcode,
                notes,
            } => {
                missorts::cmd_missorts_add(
                    &settings,
                    crate::models::NewCageAuditMissort {
                        audit_date: date.unwrap_or_else(crate::models::today),
                        sub_depot_id: sub_depot,
                        round_id: round,
                        client_id: client,
                        quantity,
                        barcode,
                        notes,
                    },
                )
                .await
            }
        },
        Commands::Report { command } => match command {
            ReportCommands::Missorts {
                date,
                sub_depot,
                save,
                submitter,
            } => report::cmd_report_missorts(&settings, date, sub_depot, save, submitter).await,
            ReportCommands::CageReturn {
                date,
                sub_depot,
                not_returned,
                notes,
                save,
                submitter,
            } => {
                report::cmd_report_cage_return(
                    &settings,
                    date,
                    sub_depot,
                    &not_returned,
                    notes,
                    save,
                    submitter,
                )
                .await
            }
            ReportCommands::DucSummary {
                date,
                submit,
                total_returns,
                failed_rounds,
                submitter,
            } => {
                report::cmd_report_duc(
                    &settings,
                    date,
                    submit,
                    total_returns,
                    &failed_rounds,
                    submitter,
                )
                .await
            }
        },
    }
}
