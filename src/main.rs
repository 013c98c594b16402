use std::io;
use std::process::ExitCode;

use clap::Parser;

use fino_ledger::TransactionStore;
use fino_ledger::commands;
use fino_ledger::config::{Args, Command};
use fino_ledger::logging::setup_logging;
use fino_ledger::operations::browse::run_browse;
use fino_ledger::shell::Shell;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = setup_logging(args.default_log_level(), args.log_file.as_deref()) {
        eprintln!("Could not open log file: {e}");
        return ExitCode::FAILURE;
    }

    let store = match TransactionStore::open(&args.db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open the database {}: {e}", args.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let stdin = io::stdin();
            let mut shell = Shell::new(&store, stdin.lock(), io::stdout());
            if let Err(e) = shell.run() {
                eprintln!("Error reading input: {e}");
                return ExitCode::FAILURE;
            }
        }
        Command::Browse => {
            if let Err(e) = run_browse(&store) {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
        command => match commands::execute(&store, &command) {
            Ok(message) => println!("{message}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
