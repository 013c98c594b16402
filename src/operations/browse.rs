use std::cmp::max;
use std::io;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::format::{category_display_name, format_currency, format_signed, transaction_type_label};
use crate::models::transaction::Transaction;
use crate::operations::summary::{Totals, TypeFilter, compute_totals, filter_and_sort};
use crate::store::TransactionStore;

/// What the user asked for. The key handler only produces these; the run loop
/// is the one place that talks to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseEvent {
    Quit,
    Refresh,
    Delete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Details,
    ConfirmDelete,
}

struct BrowseState {
    mode: Mode,

    transactions: Vec<Transaction>,
    visible: Vec<Transaction>,
    totals: Totals,
    filter: TypeFilter,

    table_state: TableState,
    status: Option<String>,

    // Cached per-draw
    last_page_size: usize,
}

impl BrowseState {
    fn new(transactions: Vec<Transaction>) -> Self {
        let mut state = Self {
            mode: Mode::List,
            transactions: Vec::new(),
            visible: Vec::new(),
            totals: Totals::default(),
            filter: TypeFilter::All,
            table_state: TableState::default(),
            status: None,
            last_page_size: 10,
        };
        state.replace_transactions(transactions);
        state
    }

    fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.totals = compute_totals(&self.transactions);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.visible = filter_and_sort(&self.transactions, self.filter);

        if self.visible.is_empty() {
            self.table_state.select(None);
        } else {
            let selected = self
                .table_state
                .selected()
                .map_or(0, |sel| sel.min(self.visible.len() - 1));
            self.table_state.select(Some(selected));
        }
    }

    fn selected_transaction(&self) -> Option<&Transaction> {
        self.visible.get(self.table_state.selected()?)
    }

    fn move_selection(&mut self, delta: i32) {
        if self.visible.is_empty() {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.visible.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn page_up(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(-page);
    }

    fn page_down(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(page);
    }

    fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.recompute();
    }

    fn open_details(&mut self) {
        if self.selected_transaction().is_some() {
            self.mode = Mode::Details;
        }
    }

    fn ask_delete(&mut self) {
        if self.selected_transaction().is_some() {
            self.mode = Mode::ConfirmDelete;
        }
    }
}

pub fn run_browse(store: &TransactionStore) -> Result<(), LedgerError> {
    enable_raw_mode().map_err(LedgerError::Terminal)?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(LedgerError::Terminal(e));
    }

    let result = browse_loop(store, stdout);

    let raw_mode = disable_raw_mode();
    let mut stdout = io::stdout();
    let screen = execute!(stdout, LeaveAlternateScreen);
    finish_session(result, [raw_mode, screen])
}

/// Every restore step has already run; report the session's own error first,
/// then the first step that failed.
fn finish_session(result: Result<(), LedgerError>, restore_steps: [io::Result<()>; 2]) -> Result<(), LedgerError> {
    result?;
    for step in restore_steps {
        step.map_err(LedgerError::Terminal)?;
    }
    Ok(())
}

fn browse_loop(store: &TransactionStore, stdout: io::Stdout) -> Result<(), LedgerError> {
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).map_err(LedgerError::Terminal)?;

    let mut state = BrowseState::new(store.load_all()?);

    loop {
        terminal
            .draw(|frame| {
                let size = frame.area();
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(3),
                    ])
                    .split(size);

                render_header(frame, layout[0], &state);
                render_totals(frame, layout[1], &state.totals);
                render_table(frame, layout[2], &mut state);
                render_footer(frame, layout[3], &state);

                match state.mode {
                    Mode::Details => render_details_modal(frame, size, &state),
                    Mode::ConfirmDelete => render_confirm_modal(frame, size, &state),
                    Mode::List => {}
                }
            })
            .map_err(LedgerError::Terminal)?;

        if event::poll(std::time::Duration::from_millis(200)).map_err(LedgerError::Terminal)? {
            if let Event::Key(key) = event::read().map_err(LedgerError::Terminal)? {
                if let Some(event) = handle_key(&mut state, key) {
                    if dispatch(store, &mut state, event) {
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Apply `event` to the store. Returns `true` when the browser should close.
///
/// Storage failures are shown in the status line instead of ending the session.
fn dispatch(store: &TransactionStore, state: &mut BrowseState, event: BrowseEvent) -> bool {
    let outcome = match event {
        BrowseEvent::Quit => return true,
        BrowseEvent::Refresh => store.load_all().map(|transactions| {
            state.replace_transactions(transactions);
            "Reloaded".to_string()
        }),
        BrowseEvent::Delete(id) => store.delete(&id).and_then(|removed| {
            state.replace_transactions(store.load_all()?);
            Ok(if removed {
                "Transaction deleted".to_string()
            } else {
                "Transaction was already deleted".to_string()
            })
        }),
    };

    state.status = Some(match outcome {
        Ok(message) => message,
        Err(e) => {
            tracing::error!("browse action failed: {e}");
            format!("Error: {e}")
        }
    });
    false
}

fn handle_key(state: &mut BrowseState, key: KeyEvent) -> Option<BrowseEvent> {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(BrowseEvent::Quit);
    }

    match state.mode {
        Mode::List => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(BrowseEvent::Quit),
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.page_up(),
            KeyCode::PageDown => state.page_down(),
            KeyCode::Home => state.move_selection(i32::MIN / 2),
            KeyCode::End => state.move_selection(i32::MAX / 2),
            KeyCode::Enter => state.open_details(),
            KeyCode::Char('t') => state.cycle_filter(),
            KeyCode::Char('D') | KeyCode::Delete => state.ask_delete(),
            KeyCode::Char('r') => return Some(BrowseEvent::Refresh),
            _ => {}
        },
        Mode::Details => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => state.mode = Mode::List,
            KeyCode::Char('D') | KeyCode::Delete => state.mode = Mode::ConfirmDelete,
            _ => {}
        },
        Mode::ConfirmDelete => {
            state.mode = Mode::List;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                return state
                    .selected_transaction()
                    .map(|transaction| BrowseEvent::Delete(transaction.id.clone()));
            }
            state.status = Some("Delete cancelled".to_string());
        }
    }

    None
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let line = Line::from(vec![
        Span::styled("FINO Ledger", bold().fg(Color::Cyan)),
        Span::raw("  "),
        Span::raw(format!("Type: {}", state.filter)),
        Span::raw("  |  "),
        Span::raw(format!("Rows: {}", state.visible.len())),
        Span::raw("  |  "),
        Span::styled(
            state.status.clone().unwrap_or_default(),
            Style::default().fg(Color::Yellow),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(line).block(block).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn balance_color(balance: Decimal) -> Color {
    if balance >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    }
}

fn render_totals(frame: &mut ratatui::Frame, area: Rect, totals: &Totals) {
    let line = Line::from(vec![
        Span::raw("Balance: "),
        Span::styled(
            format_currency(totals.balance),
            bold().fg(balance_color(totals.balance)),
        ),
        Span::raw("   Income: "),
        Span::styled(format_currency(totals.income), Style::default().fg(Color::Green)),
        Span::raw("   Expense: "),
        Span::styled(format_currency(totals.expense), Style::default().fg(Color::Red)),
    ]);

    let block = Block::default().title("Summary").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let hint = match state.mode {
        Mode::List => "↑/↓ move  PgUp/PgDn page  Enter details  t type  D delete  r refresh  q/Esc exit",
        Mode::Details => "D delete  Esc/q/b back",
        Mode::ConfirmDelete => "y confirm, any other key cancels",
    };

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(hint)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut BrowseState) {
    let block = Block::default().title("Transactions").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.visible.is_empty() {
        let empty = Paragraph::new("No transactions found")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let header = Row::new([
        Cell::from("Date").style(bold()),
        Cell::from("Description").style(bold()),
        Cell::from("Category").style(bold()),
        Cell::from("Amount").style(bold()),
    ])
    .style(Style::default().fg(Color::White));

    let rows = state.visible.iter().map(|tx| {
        let mut desc = tx.description.clone();
        if desc.chars().count() > 42 {
            desc = desc.chars().take(39).collect();
            desc.push_str("...");
        }
        let color = if tx.is_income() { Color::Green } else { Color::Red };

        Row::new([
            Cell::from(tx.date.format("%Y-%m-%d").to_string()),
            Cell::from(desc),
            Cell::from(category_display_name(tx.category)),
            Cell::from(format_signed(tx.amount, tx.transaction_type)).style(Style::default().fg(color)),
        ])
    });

    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(45),
        Constraint::Length(15),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(bold().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);
}

fn render_details_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = centered_rect(80, 50, area);
    frame.render_widget(Clear, popup_area);

    let Some(tx) = state.selected_transaction() else {
        return;
    };

    let lines = vec![
        Line::from(vec![Span::styled("Transaction Details", bold().fg(Color::Cyan))]),
        Line::from(""),
        Line::from(format!("Id: {}", tx.id)),
        Line::from(format!("Date: {}", tx.date.format("%Y-%m-%d"))),
        Line::from(format!("Type: {}", transaction_type_label(tx.transaction_type))),
        Line::from(format!("Category: {}", category_display_name(tx.category))),
        Line::from(format!("Amount: {}", format_currency(tx.amount))),
        Line::from(""),
        Line::from("Description:"),
        Line::from(tx.description.clone()),
    ];

    let block = Block::default().borders(Borders::ALL).title("Details");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn render_confirm_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = centered_rect(60, 25, area);
    frame.render_widget(Clear, popup_area);

    let description = state
        .selected_transaction()
        .map(|tx| tx.description.clone())
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled("Delete this transaction?", bold().fg(Color::Red))),
        Line::from(""),
        Line::from(description),
        Line::from(""),
        Line::from("Press y to delete, any other key to cancel"),
    ];

    let block = Block::default().borders(Borders::ALL).title("Confirm");
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::models::transaction::{Category, TransactionType};
    use crate::operations::add::TransactionDraft;
    use chrono::NaiveDate;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn create_test_transaction(id: &str, transaction_type: TransactionType, day: u32) -> Transaction {
        Transaction::new(
            id.to_string(),
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            format!("Transaction {id}"),
            Decimal::new(50, 0),
            transaction_type,
            Category::Other,
        )
    }

    fn sample_state() -> BrowseState {
        BrowseState::new(vec![
            create_test_transaction("a", TransactionType::Income, 1),
            create_test_transaction("b", TransactionType::Expense, 3),
            create_test_transaction("c", TransactionType::Expense, 2),
        ])
    }

    #[test]
    fn test_finish_session_prefers_the_session_error() {
        let restore_failed = || Err(io::Error::other("raw mode"));

        let result = finish_session(Err(LedgerError::EmptyReport), [restore_failed(), Ok(())]);
        assert!(matches!(result, Err(LedgerError::EmptyReport)));

        let result = finish_session(Ok(()), [restore_failed(), Err(io::Error::other("screen"))]);
        assert!(matches!(result, Err(LedgerError::Terminal(ref e)) if e.to_string() == "raw mode"));

        assert!(finish_session(Ok(()), [Ok(()), Ok(())]).is_ok());
    }

    #[test]
    fn test_new_state_is_sorted_and_selects_first_row() {
        let state = sample_state();

        let ids: Vec<&str> = state.visible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(state.table_state.selected(), Some(0));
        assert_eq!(state.totals.balance, Decimal::new(-50, 0));
    }

    #[test]
    fn test_t_cycles_type_filter() {
        let mut state = sample_state();

        handle_key(&mut state, key(KeyCode::Char('t')));
        assert_eq!(state.filter, TypeFilter::Income);
        assert_eq!(state.visible.len(), 1);

        handle_key(&mut state, key(KeyCode::Char('t')));
        assert_eq!(state.filter, TypeFilter::Expense);
        assert_eq!(state.visible.len(), 2);

        handle_key(&mut state, key(KeyCode::Char('t')));
        assert_eq!(state.filter, TypeFilter::All);
        assert_eq!(state.visible.len(), 3);
    }

    #[test]
    fn test_filter_does_not_change_totals() {
        let mut state = sample_state();
        let before = state.totals;

        handle_key(&mut state, key(KeyCode::Char('t')));
        assert_eq!(state.totals, before);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut state = sample_state();

        handle_key(&mut state, key(KeyCode::Up));
        assert_eq!(state.table_state.selected(), Some(0));

        handle_key(&mut state, key(KeyCode::End));
        assert_eq!(state.table_state.selected(), Some(2));

        handle_key(&mut state, key(KeyCode::Down));
        assert_eq!(state.table_state.selected(), Some(2));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut state = sample_state();
        handle_key(&mut state, key(KeyCode::Down));

        assert_eq!(handle_key(&mut state, key(KeyCode::Char('D'))), None);
        assert_eq!(state.mode, Mode::ConfirmDelete);

        let event = handle_key(&mut state, key(KeyCode::Char('y')));
        assert_eq!(event, Some(BrowseEvent::Delete("c".to_string())));
        assert_eq!(state.mode, Mode::List);
    }

    #[test]
    fn test_delete_cancelled_by_other_key() {
        let mut state = sample_state();
        handle_key(&mut state, key(KeyCode::Char('D')));

        assert_eq!(handle_key(&mut state, key(KeyCode::Char('n'))), None);
        assert_eq!(state.mode, Mode::List);
        assert_eq!(state.status.as_deref(), Some("Delete cancelled"));
    }

    #[test]
    fn test_delete_on_empty_list_does_nothing() {
        let mut state = BrowseState::new(Vec::new());
        handle_key(&mut state, key(KeyCode::Char('D')));
        assert_eq!(state.mode, Mode::List);
    }

    #[test]
    fn test_quit_and_refresh_events() {
        let mut state = sample_state();
        assert_eq!(handle_key(&mut state, key(KeyCode::Char('r'))), Some(BrowseEvent::Refresh));
        assert_eq!(handle_key(&mut state, key(KeyCode::Char('q'))), Some(BrowseEvent::Quit));
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut state = sample_state();
        let mut release = key(KeyCode::Char('q'));
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_key(&mut state, release), None);
    }

    #[test]
    fn test_dispatch_delete_removes_from_store_and_view() {
        let store = TransactionStore::from_connection(establish_test_connection().unwrap()).unwrap();
        let added = store
            .add(TransactionDraft::new("Coffee", Decimal::new(3, 0), TransactionType::Expense, Category::Food))
            .unwrap();
        let mut state = BrowseState::new(store.load_all().unwrap());

        let quit = dispatch(&store, &mut state, BrowseEvent::Delete(added.id.clone()));

        assert!(!quit);
        assert!(store.load_all().unwrap().is_empty());
        assert!(state.visible.is_empty());
        assert_eq!(state.table_state.selected(), None);
        assert_eq!(state.status.as_deref(), Some("Transaction deleted"));
    }

    #[test]
    fn test_dispatch_quit() {
        let store = TransactionStore::from_connection(establish_test_connection().unwrap()).unwrap();
        let mut state = BrowseState::new(Vec::new());
        assert!(dispatch(&store, &mut state, BrowseEvent::Quit));
    }

    #[test]
    fn test_balance_color() {
        assert_eq!(balance_color(Decimal::ZERO), Color::Green);
        assert_eq!(balance_color(Decimal::new(-1, 0)), Color::Red);
    }
}
