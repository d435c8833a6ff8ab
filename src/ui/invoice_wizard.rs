use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::actions::schema::{FieldErrors, FormData};
use crate::models::{Customer, Invoice, InvoiceStatus};

// Represents a field in the invoice form
#[derive(Clone, Copy, PartialEq)]
pub enum InvoiceField {
    Customer,
    Amount,
    Status,
}

// Represents the form state
pub struct InvoiceWizardState {
    invoice_id: Option<i64>,
    invoice_date: Option<NaiveDate>,
    customers: Vec<Customer>,
    customer_index: Option<usize>,
    amount_input: String,
    status: Option<InvoiceStatus>,
    current_field: InvoiceField,
    editing: bool,
    errors: FieldErrors,
    message: Option<String>,
}

impl InvoiceWizardState {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self {
            invoice_id: None,
            invoice_date: None,
            customers,
            customer_index: None,
            amount_input: String::new(),
            status: None,
            current_field: InvoiceField::Customer,
            editing: false,
            errors: FieldErrors::default(),
            message: None,
        }
    }

    pub fn from_existing(invoice: Invoice, customers: Vec<Customer>) -> Self {
        let customer_index = customers.iter().position(|c| c.id == invoice.customer_id);
        // Stored cents back to the dollar form the input expects.
        let amount_input = format!("{}.{:02}", invoice.amount / 100, invoice.amount % 100);

        Self {
            invoice_id: Some(invoice.id),
            invoice_date: Some(invoice.date),
            customers,
            customer_index,
            amount_input,
            status: Some(invoice.status),
            current_field: InvoiceField::Customer,
            editing: false,
            errors: FieldErrors::default(),
            message: None,
        }
    }

    /// The raw form submission. Coercion and checking happen in the
    /// validation schema, never here: unset fields are simply absent and
    /// the amount goes out as the text that was typed.
    pub fn form_data(&self) -> FormData {
        let mut form = FormData::new();
        if let Some(idx) = self.customer_index {
            form.set("customer_id", self.customers[idx].id.clone());
        }
        form.set("amount", self.amount_input.clone());
        if let Some(status) = self.status {
            form.set("status", status.as_str());
        }
        form
    }

    pub fn set_errors(&mut self, errors: FieldErrors, message: String) {
        self.errors = errors;
        self.message = Some(message);
    }

    pub fn set_message(&mut self, message: String) {
        self.errors = FieldErrors::default();
        self.message = Some(message);
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            InvoiceField::Customer => InvoiceField::Amount,
            InvoiceField::Amount => InvoiceField::Status,
            InvoiceField::Status => InvoiceField::Customer,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            InvoiceField::Customer => InvoiceField::Status,
            InvoiceField::Amount => InvoiceField::Customer,
            InvoiceField::Status => InvoiceField::Amount,
        };
    }

    fn next_customer(&mut self) {
        if self.customers.is_empty() {
            return;
        }

        self.customer_index = Some(match self.customer_index {
            Some(i) if i + 1 < self.customers.len() => i + 1,
            Some(_) => 0,
            None => 0,
        });
    }

    fn previous_customer(&mut self) {
        if self.customers.is_empty() {
            return;
        }

        self.customer_index = Some(match self.customer_index {
            Some(0) | None => self.customers.len() - 1,
            Some(i) => i - 1,
        });
    }

    fn toggle_status(&mut self) {
        self.status = Some(match self.status {
            Some(InvoiceStatus::Pending) => InvoiceStatus::Paid,
            Some(InvoiceStatus::Paid) => InvoiceStatus::Pending,
            None => InvoiceStatus::Pending,
        });
    }

    fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match self.current_field {
            InvoiceField::Customer => match key {
                KeyCode::Up => self.previous_customer(),
                KeyCode::Down => self.next_customer(),
                _ => {}
            },
            InvoiceField::Amount => match key {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                    self.amount_input.push(c);
                }
                KeyCode::Backspace => {
                    self.amount_input.pop();
                }
                _ => {}
            },
            InvoiceField::Status => match key {
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => self.toggle_status(),
                _ => {}
            },
        }
    }
}

pub enum InvoiceWizardAction {
    Cancel,
    /// Raw form fields for the create/update mutation handler.
    Submit(FormData),
}

fn field_lines(label: &str, value: String, active: bool, errors: &[String]) -> Vec<Spans<'static>> {
    let label_style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let mut lines = vec![Spans::from(vec![
        Span::styled(format!("{label}: "), label_style),
        Span::raw(value),
    ])];

    for error in errors {
        lines.push(Spans::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

pub fn render_invoice_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut InvoiceWizardState) {
    let size = frame.size();

    // The creation date is shown but never editable; update leaves it as is.
    let title = match (state.invoice_id, state.invoice_date) {
        (Some(id), Some(date)) => format!("Edit Invoice #{id} ({date})"),
        (Some(id), None) => format!("Edit Invoice #{id}"),
        _ => "New Invoice".to_string(),
    };

    let outer = Block::default().title(title).borders(Borders::ALL);
    let inner = outer.inner(size);
    frame.render_widget(outer, size);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Min(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(inner);

    // Customer
    let customer_value = match state.customer_index {
        Some(idx) => {
            let name = state.customers[idx].name.clone();
            if state.current_field == InvoiceField::Customer && state.editing {
                format!("< {name} >")
            } else {
                name
            }
        }
        None if state.current_field == InvoiceField::Customer && state.editing => {
            "< choose with Up/Down >".to_string()
        }
        None => "(none)".to_string(),
    };
    let customer = Paragraph::new(field_lines(
        "Customer",
        customer_value,
        state.current_field == InvoiceField::Customer,
        state.errors.get("customer_id"),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(customer, chunks[0]);

    // Amount
    let amount_value = if state.current_field == InvoiceField::Amount && state.editing {
        format!("{}|", state.amount_input)
    } else {
        state.amount_input.clone()
    };
    let amount = Paragraph::new(field_lines(
        "Amount ($)",
        amount_value,
        state.current_field == InvoiceField::Amount,
        state.errors.get("amount"),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(amount, chunks[1]);

    // Status
    let status_value = match state.status {
        Some(status) => status.as_str().to_string(),
        None => "(none)".to_string(),
    };
    let status = Paragraph::new(field_lines(
        "Status",
        status_value,
        state.current_field == InvoiceField::Status,
        state.errors.get("status"),
    ))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    // Summary or database message from the last submission
    if let Some(message) = &state.message {
        let message = Paragraph::new(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ));
        frame.render_widget(message, chunks[3]);
    }

    let help = Paragraph::new("<Up/Down> Field | <Enter> Edit | <S> Save | <Esc> Cancel")
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(help, chunks[4]);
}

pub fn handle_input(state: &mut InvoiceWizardState) -> Result<Option<InvoiceWizardAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Esc => {
                if state.editing {
                    state.editing = false;
                } else {
                    return Ok(Some(InvoiceWizardAction::Cancel));
                }
            }
            KeyCode::Enter => {
                state.editing = !state.editing;
            }
            KeyCode::Char('s') if !state.editing => {
                // Submit the raw fields; the handler validates and the
                // outcome comes back through set_errors/set_message.
                return Ok(Some(InvoiceWizardAction::Submit(state.form_data())));
            }
            KeyCode::Up if !state.editing => {
                state.previous_field();
            }
            KeyCode::Down if !state.editing => {
                state.next_field();
            }
            _ if state.editing => {
                state.edit_current_field(key.code);
            }
            _ => {}
        }
    }

    Ok(None)
}
