pub mod accounts;
pub mod banks;
pub mod commit;
pub mod dashboard;
pub mod import;
pub mod init;
pub mod status;
pub mod transactions;
pub mod upload;
pub mod users;

use std::path::PathBuf;

use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::get_connection;
use crate::error::{EkstreError, Result};
use crate::fmt::{local_time, money};
use crate::models::ParsedRecord;
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(
    name = "ekstre",
    version,
    about = "Import Turkish bank statement spreadsheets into a personal ledger."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for ekstre data (default: ~/Documents/ekstre)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage account owners.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// List supported banks.
    Banks,
    /// Parse a statement and show the new transactions without saving them.
    Upload {
        #[command(flatten)]
        target: StatementArgs,
        /// Print the parsed records as JSON, ready for `ekstre commit`
        #[arg(long)]
        json: bool,
    },
    /// Parse a statement and save its new transactions.
    Import {
        #[command(flatten)]
        target: StatementArgs,
    },
    /// Save a reviewed batch of records produced by `ekstre upload --json`.
    Commit {
        /// Path to the JSON batch
        file: String,
        /// Account name to save into
        #[arg(long)]
        account: String,
        /// Owner email
        #[arg(long)]
        user: String,
    },
    /// List an account's transactions, oldest first.
    Transactions {
        /// Account name
        #[arg(long)]
        account: String,
        /// Owner email
        #[arg(long)]
        user: String,
    },
    /// Show account balances and recent transactions.
    Dashboard {
        /// Owner email
        #[arg(long)]
        user: String,
        /// Number of recent transactions to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(clap::Args)]
pub struct StatementArgs {
    /// Path to the statement spreadsheet
    pub file: String,
    /// Bank key or name (see `ekstre banks`)
    #[arg(long)]
    pub bank: String,
    /// Account name the statement belongs to
    #[arg(long)]
    pub account: String,
    /// Owner email
    #[arg(long)]
    pub user: String,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Add an account owner.
    Add {
        /// Owner email
        email: String,
    },
    /// List all owners.
    List,
    /// Change an owner's email.
    Update {
        /// User ID (shown in `ekstre users list`)
        id: i64,
        /// New email
        #[arg(long)]
        email: String,
    },
    /// Delete an owner with all of their accounts and transactions.
    Delete {
        /// User ID (shown in `ekstre users list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'Vadesiz TL'
        name: String,
        /// Owner email
        #[arg(long)]
        user: String,
        /// Account category
        #[arg(long, default_value = "Checking")]
        category: String,
        /// Currency symbol: ₺, $ or €
        #[arg(long, default_value = "₺")]
        currency: String,
    },
    /// List an owner's accounts.
    List {
        /// Owner email
        #[arg(long)]
        user: String,
    },
    /// Update an account.
    Update {
        /// Account ID (shown in `ekstre accounts list`)
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// New currency symbol
        #[arg(long)]
        currency: Option<String>,
    },
    /// Delete an account and its transactions.
    Delete {
        /// Account ID (shown in `ekstre accounts list`)
        id: i64,
    },
}

/// Open the configured database, refusing to create one outside `init`.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(EkstreError::Settings(format!(
            "database not found at {}. Run `ekstre init` first",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

pub(crate) fn settings_and_db() -> Result<(Settings, Connection)> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    Ok((settings, conn))
}

pub(crate) fn amount_cell(amount: Decimal, symbol: &str) -> Cell {
    let text = money(amount, symbol);
    if amount.is_sign_negative() && !amount.is_zero() {
        Cell::new(text.red().to_string())
    } else {
        Cell::new(text.green().to_string())
    }
}

pub(crate) fn records_table(records: &[ParsedRecord], symbol: &str, tz: Tz) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "#", "Description", "Amount", "Balance"]);
    for r in records {
        table.add_row(vec![
            Cell::new(local_time(r.timestamp, tz)),
            Cell::new(r.order),
            Cell::new(&r.description),
            amount_cell(r.amount, symbol),
            Cell::new(money(r.balance, symbol)),
        ]);
    }
    table
}

pub(crate) fn expand_data_dir(data_dir: Option<String>) -> PathBuf {
    match data_dir {
        Some(dir) => PathBuf::from(crate::settings::shellexpand_path(&dir)),
        None => PathBuf::from(load_settings().data_dir),
    }
}
