use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::cache::Listing;
use crate::listing::ListingQuery;
use crate::models::{format_cents, InvoiceRow};
use crate::ui::components::search_input::SearchInputState;

// Represents the state of the invoice listing screen
pub struct InvoicesState {
    params: ListingQuery,
    rows: Vec<InvoiceRow>,
    total_pages: u32,
    table_state: TableState,
    search: SearchInputState,
    status_message: Option<String>,
}

impl InvoicesState {
    pub fn new(params: ListingQuery, listing: Listing) -> Self {
        let mut table_state = TableState::default();
        if !listing.rows.is_empty() {
            table_state.select(Some(0));
        }

        let search = SearchInputState::new(params.query_str());

        Self {
            params,
            rows: listing.rows,
            total_pages: listing.total_pages,
            table_state,
            search,
            status_message: None,
        }
    }

    /// Swap in freshly fetched rows without disturbing the search box.
    pub fn set_listing(&mut self, listing: Listing) {
        self.rows = listing.rows;
        self.total_pages = listing.total_pages;

        let selected = if self.rows.is_empty() {
            None
        } else {
            Some(self.table_state.selected().unwrap_or(0).min(self.rows.len() - 1))
        };
        self.table_state.select(selected);
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn params(&self) -> &ListingQuery {
        &self.params
    }

    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= self.rows.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.rows.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_invoice_id(&self) -> Option<i64> {
        self.table_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|row| row.id)
    }
}

pub enum InvoiceAction {
    Exit,
    NewInvoice,
    EditInvoice(i64),   // Contains invoice_id
    DeleteInvoice(i64), // Contains invoice_id
    /// Search committed or page moved; the caller refetches.
    ParamsChanged,
}

pub fn render_invoices<B: Backend>(frame: &mut Frame<B>, state: &mut InvoicesState) {
    let size = frame.size();

    // Create the layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(size);

    // Search box, titled with the canonical parameter rendering
    let search_style = if state.search.focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search_title = format!("Search invoices {}", state.params.query_string());
    let search = Paragraph::new(state.search.display_string())
        .style(search_style)
        .block(Block::default().title(search_title).borders(Borders::ALL));
    frame.render_widget(search, chunks[0]);

    // Define the header cells
    let header_cells = ["Customer", "Amount", "Status", "Date"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default())
        .height(1)
        .bottom_margin(1);

    // Create the rows with data
    let rows = state.rows.iter().map(|invoice: &InvoiceRow| {
        let cells = vec![
            Cell::from(invoice.customer_name.clone()),
            Cell::from(format_cents(invoice.amount)),
            Cell::from(invoice.status.as_str()),
            Cell::from(invoice.date.format("%Y-%m-%d").to_string()),
        ];

        Row::new(cells).height(1)
    });

    // Create the table
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("Invoices").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ]);

    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    // Footer: pagination, key help, and the latest mutation message
    let pages = format!("Page {} of {}", state.params.page, state.total_pages.max(1));
    let help = if state.search.focused {
        format!("{pages} | Type to search | <Esc> Done")
    } else {
        format!("{pages} | </> Search | <N> New | <E> Edit | <D> Delete | <Left/Right> Page | <Esc> Quit")
    };

    let mut footer_lines = vec![Spans::from(help)];
    if let Some(message) = &state.status_message {
        let style = if message.starts_with("Database Error") {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        footer_lines.push(Spans::from(Span::styled(message.clone(), style)));
    }

    let footer = Paragraph::new(footer_lines)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(footer, chunks[2]);
}

pub fn handle_input(state: &mut InvoicesState) -> Result<Option<InvoiceAction>> {
    // Poll with a short timeout so the debounce timer fires between
    // keystrokes as well.
    if event::poll(Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            if state.search.focused {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => {
                        state.search.focused = false;
                    }
                    code => {
                        state.search.handle_input(code, Instant::now());
                    }
                }
            } else {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        return Ok(Some(InvoiceAction::Exit));
                    }
                    KeyCode::Char('/') => {
                        state.search.focused = true;
                    }
                    KeyCode::Char('n') => {
                        return Ok(Some(InvoiceAction::NewInvoice));
                    }
                    KeyCode::Char('e') => {
                        if let Some(id) = state.selected_invoice_id() {
                            return Ok(Some(InvoiceAction::EditInvoice(id)));
                        }
                    }
                    KeyCode::Char('d') => {
                        if let Some(id) = state.selected_invoice_id() {
                            return Ok(Some(InvoiceAction::DeleteInvoice(id)));
                        }
                    }
                    KeyCode::Down => {
                        state.next();
                    }
                    KeyCode::Up => {
                        state.previous();
                    }
                    KeyCode::Left => {
                        if state.params.page > 1 {
                            let page = state.params.page - 1;
                            state.params.set_page(page, state.total_pages);
                            return Ok(Some(InvoiceAction::ParamsChanged));
                        }
                    }
                    KeyCode::Right => {
                        if state.params.page < state.total_pages {
                            let page = state.params.page + 1;
                            state.params.set_page(page, state.total_pages);
                            return Ok(Some(InvoiceAction::ParamsChanged));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    // A committed search replaces the parameters in place: the page
    // restarts at 1 and an empty term drops the query parameter.
    if let Some(term) = state.search.poll(Instant::now()) {
        state.params.apply_search(&term);
        return Ok(Some(InvoiceAction::ParamsChanged));
    }

    Ok(None)
}
