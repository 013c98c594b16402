use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::commands;
use crate::operations::add::TransactionDraft;
use crate::operations::report::ExportFormat;
use crate::operations::summary::TypeFilter;
use crate::store::TransactionStore;

const PROMPT: &str = "Please enter a command (add, remove, list, summary, export, import, help, exit):";
const HELP: &str = "\
add                      record a transaction (you will be asked for the details)
remove                   delete a transaction by id
list [all|income|expense]  show transactions, newest first
summary                  show balance, income and expense
export [text|csv] [path] write a report of every transaction
import <path>            import transactions from a CSV file
exit                     leave the program";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserCommand {
    Add,
    Remove,
    List,
    Summary,
    Export,
    Import,
    Help,
    Exit,
    Unknown,
}

fn check_for_command(input: &str) -> UserCommand {
    match input.to_lowercase().as_str() {
        "add" => UserCommand::Add,
        "remove" | "delete" => UserCommand::Remove,
        "list" | "print" => UserCommand::List,
        "summary" | "totals" => UserCommand::Summary,
        "export" | "report" => UserCommand::Export,
        "import" => UserCommand::Import,
        "help" | "?" => UserCommand::Help,
        "exit" | "quit" => UserCommand::Exit,
        _ => UserCommand::Unknown,
    }
}

/// What follows the first `words` words of `line`, so paths may contain spaces.
fn rest_after_words(line: &str, words: usize) -> Option<&str> {
    let mut rest = line.trim();
    for _ in 0..words {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    (!rest.is_empty()).then_some(rest)
}

/// Line-oriented session over any reader and writer.
///
/// A failed command is reported and the loop carries on; only I/O errors on the
/// session streams end it.
pub struct Shell<'a, R, W> {
    store: &'a TransactionStore,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(store: &'a TransactionStore, input: R, output: W) -> Self {
        Self { store, input, output }
    }

    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "Welcome to the transaction manager!")?;

        loop {
            writeln!(self.output, "{PROMPT}")?;
            let Some(line) = self.read_user_input()? else {
                break;
            };

            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some(first) = parts.first() else {
                continue;
            };

            match check_for_command(first) {
                UserCommand::Add => self.add()?,
                UserCommand::Remove => self.remove(parts.get(1).copied())?,
                UserCommand::List => {
                    let result = TypeFilter::from_str(parts.get(1).copied().unwrap_or("all"))
                        .map_err(Into::into)
                        .and_then(|filter| commands::list(self.store, filter));
                    self.report(result)?;
                }
                UserCommand::Summary => {
                    let result = commands::summary(self.store);
                    self.report(result)?;
                }
                UserCommand::Export => {
                    let result = ExportFormat::from_str(parts.get(1).copied().unwrap_or("text"))
                        .map_err(Into::into)
                        .and_then(|format| commands::export(self.store, format, rest_after_words(&line, 2).map(Path::new)));
                    self.report(result)?;
                }
                UserCommand::Import => match rest_after_words(&line, 1) {
                    Some(path) => {
                        let result = commands::import(self.store, Path::new(path));
                        self.report(result)?;
                    }
                    None => writeln!(self.output, "Usage: import <path>")?,
                },
                UserCommand::Help => writeln!(self.output, "{HELP}")?,
                UserCommand::Exit => {
                    writeln!(self.output, "Exiting the application.")?;
                    break;
                }
                UserCommand::Unknown => {
                    writeln!(self.output, "Unknown command '{first}'. Type 'help' for the list of commands.")?
                }
            }
        }

        Ok(())
    }

    fn add(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "Enter transaction details in the format:\n\
             date(YYYY-MM-DD, empty for today), description, amount, type(income/expense), category"
        )?;
        let Some(details) = self.read_user_input()? else {
            return Ok(());
        };

        let result = TransactionDraft::from_line(&details)
            .map_err(Into::into)
            .and_then(|draft| commands::add(self.store, draft));
        self.report(result)
    }

    fn remove(&mut self, id: Option<&str>) -> io::Result<()> {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                writeln!(self.output, "Provide the transaction ID to remove:")?;
                match self.read_user_input()? {
                    Some(id) if !id.is_empty() => id,
                    _ => {
                        writeln!(self.output, "Transaction ID cannot be empty.")?;
                        return Ok(());
                    }
                }
            }
        };

        writeln!(self.output, "Are you sure you want to delete transaction {id}? [y/N]")?;
        let confirmed = self
            .read_user_input()?
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"));
        if !confirmed {
            return writeln!(self.output, "Nothing deleted.");
        }

        let result = commands::remove(self.store, &id);
        self.report(result)
    }

    fn report(&mut self, result: Result<String, crate::error::LedgerError>) -> io::Result<()> {
        match result {
            Ok(message) => writeln!(self.output, "{message}"),
            Err(e) => {
                if e.is_validation() {
                    tracing::warn!("rejected input: {e}");
                }
                writeln!(self.output, "Error: {e}")?;
                writeln!(self.output, "Please try again.")
            }
        }
    }

    /// `None` at end of input.
    fn read_user_input(&mut self) -> io::Result<Option<String>> {
        let mut input = String::new();
        if self.input.read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }
}
