//! # potluck
//!
//! Command-line front end for the shared-expense ledger.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          potluck CLI                                    │
//! │                                                                         │
//! │  group.json ───► GroupSnapshot ───► potluck_core::ledger ───► stdout   │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                  CliError (JSON) ───► stderr           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! potluck seed > group.json
//! potluck sheet group.json
//! potluck statement group.json --member 2
//! potluck record group.json taxi.json --append > next.json
//! ```

mod config;
mod error;
mod seed;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use potluck_core::ledger;
use potluck_core::{ExpenseId, GroupSnapshot, MemberId, NewExpense};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LogFormat};
use crate::error::{CliError, ErrorCode};

#[derive(Parser)]
#[command(
    name = "potluck",
    version,
    about = "Shared-expense ledger: balances and settlement plans for a group",
    long_about = "potluck reads a group snapshot (members, expenses, shares and \
                  payments) as JSON and reports who owes what and who should pay \
                  whom. Amounts are integer minor units (cents)."
)]
struct Cli {
    /// Print single-line JSON instead of indented JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a demo group snapshot
    Seed {
        /// Reference time the demo expenses are dated from (RFC 3339)
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },

    /// Balances of every member plus the settlement plan
    #[command(alias = "balances")]
    Sheet {
        /// Group snapshot JSON file
        snapshot: PathBuf,
    },

    /// Settlement plan only
    Settle {
        /// Group snapshot JSON file
        snapshot: PathBuf,
    },

    /// One member's balance and history, newest first
    Statement {
        /// Group snapshot JSON file
        snapshot: PathBuf,
        /// Member ID
        #[arg(short, long, env = "POTLUCK_MEMBER")]
        member: i64,
    },

    /// List expenses, newest first
    Expenses {
        /// Group snapshot JSON file
        snapshot: PathBuf,
    },

    /// Show one expense with member names
    Expense {
        /// Group snapshot JSON file
        snapshot: PathBuf,
        /// Expense ID
        #[arg(long)]
        id: i64,
    },

    /// Validate a new expense and allocate its shares
    Record {
        /// Group snapshot JSON file
        snapshot: PathBuf,
        /// New expense JSON file
        expense: PathBuf,
        /// Expense ID (default: highest existing ID + 1)
        #[arg(long)]
        id: Option<i64>,
        /// Creation time (RFC 3339, default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Print the whole group snapshot with the expense appended
        #[arg(long)]
        append: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load() {
        Ok(config) => config,
        Err(err) => return report(err.into()),
    };
    init_tracing(&config);
    debug!(?config, "Configuration loaded");

    let pretty = config.pretty_json && !cli.compact;
    match run(cli.command, pretty) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

fn init_tracing(config: &CliConfig) {
    // Filter was validated when the config loaded
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .with_target(true);

    match config.log_format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn report(err: CliError) -> ExitCode {
    debug!(code = ?err.code, "Command failed");
    eprintln!("{}", err.to_json());
    ExitCode::FAILURE
}

fn run(command: Commands, pretty: bool) -> Result<(), CliError> {
    match command {
        Commands::Seed { as_of } => {
            let group = seed::demo_group(as_of.unwrap_or_else(Utc::now))?;
            emit(&group, pretty)
        }

        Commands::Sheet { snapshot } => {
            let group = load_snapshot(&snapshot)?;
            emit(&ledger::balance_sheet(&group)?, pretty)
        }

        Commands::Settle { snapshot } => {
            let group = load_snapshot(&snapshot)?;
            emit(&ledger::settlement_plan(&group)?, pretty)
        }

        Commands::Statement { snapshot, member } => {
            let group = load_snapshot(&snapshot)?;
            emit(&ledger::member_statement(&group, MemberId::new(member))?, pretty)
        }

        Commands::Expenses { snapshot } => {
            let group = load_snapshot(&snapshot)?;
            emit(&ledger::expense_summaries(&group), pretty)
        }

        Commands::Expense { snapshot, id } => {
            let group = load_snapshot(&snapshot)?;
            emit(&ledger::expense_details(&group, ExpenseId::new(id))?, pretty)
        }

        Commands::Record {
            snapshot,
            expense,
            id,
            at,
            append,
        } => {
            let mut group = load_snapshot(&snapshot)?;
            let new: NewExpense = load_json(&expense)?;

            let id = match id {
                Some(id) => id,
                None => next_expense_id(&group)?,
            };
            let recorded =
                ledger::record_expense(&group, ExpenseId::new(id), new, at.unwrap_or_else(Utc::now))?;

            if append {
                group.expenses.push(recorded);
                emit(&group, pretty)
            } else {
                emit(&recorded, pretty)
            }
        }
    }
}

fn next_expense_id(group: &GroupSnapshot) -> Result<i64, CliError> {
    let last = group
        .expenses
        .iter()
        .map(|e| e.expense.id.get())
        .max()
        .unwrap_or(0);
    last.checked_add(1).ok_or_else(|| {
        CliError::new(
            ErrorCode::InvalidInput,
            format!("no expense id follows {last}; pass --id explicitly"),
        )
    })
}

fn load_snapshot(path: &Path) -> anyhow::Result<GroupSnapshot> {
    let group: GroupSnapshot = load_json(path)?;
    info!(
        group_id = %group.group_id,
        members = group.members.len(),
        expenses = group.expenses.len(),
        "Snapshot loaded"
    );
    Ok(group)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize output")?;

    println!("{out}");
    Ok(())
}
