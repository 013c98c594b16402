use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Personal finance ledger: record income and expenses, see totals, export reports.
#[derive(Parser, Debug)]
#[command(name = "fino", version, about, long_about = None)]
pub struct Args {
    /// File path to the ledger SQLite database.
    #[arg(long, env = "FINO_DB_PATH", default_value = "financial_app.db")]
    pub db_path: PathBuf,

    /// Write logs to this file instead of stderr.
    #[arg(long, env = "FINO_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Record a new income or expense.
    Add {
        #[arg(long)]
        description: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// income or expense
        #[arg(long = "type")]
        transaction_type: String,
        /// salary, freelance, investment, food, transportation, entertainment, shopping, utilities or other
        #[arg(long)]
        category: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a transaction by id.
    Remove { id: String },
    /// List transactions, newest first.
    List {
        /// all, income or expense
        #[arg(default_value = "all")]
        filter: String,
    },
    /// Show total income, expense and balance.
    Summary,
    /// Browse transactions in a terminal UI.
    Browse,
    /// Write a report of every transaction.
    Export {
        /// text or csv
        #[arg(long, default_value = "text")]
        format: String,
        /// Defaults to financial_report_<today>.<ext>
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import headerless date,description,amount,type,category rows from a CSV file.
    Import { path: PathBuf },
    /// Interactive prompt (the default).
    Shell,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
