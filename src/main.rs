mod actions;
mod cache;
mod config;
mod db;
mod listing;
mod models;
mod ui;

use std::io;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::actions::{DeleteOutcome, MutationOutcome, Route};
use crate::cache::{Listing, ListingCache, ListingKey};
use crate::listing::ListingQuery;
use crate::ui::{
    invoice_wizard::{
        handle_input as handle_wizard_input, render_invoice_wizard, InvoiceWizardAction,
        InvoiceWizardState,
    },
    invoices::{
        handle_input as handle_invoices_input, render_invoices, InvoiceAction, InvoicesState,
    },
};

// Represents the current screen in the app
enum AppScreen {
    Invoices,
    InvoiceWizard(Option<i64>), // Contains the invoice id when editing
}

// Main application state
struct AppState {
    db: db::Database,
    cache: ListingCache,
    screen: AppScreen,
    invoices_state: Option<InvoicesState>,
    wizard_state: Option<InvoiceWizardState>,
}

impl AppState {
    fn new(db: db::Database) -> Self {
        Self {
            db,
            cache: ListingCache::new(),
            screen: AppScreen::Invoices,
            invoices_state: None,
            wizard_state: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = config::Args::parse();

    // The TUI owns stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Load configuration
    let config = config::init(&args)?;

    // Initialize database connection
    let db = db::init(&config).await?;
    tracing::info!("database connection established");

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app_state = AppState::new(db);

    // Initialize the listing screen
    load_invoices_screen(&mut app_state, ListingQuery::default()).await?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = result {
        println!("Error: {}", err);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        // Render current screen
        terminal.draw(|f| match app_state.screen {
            AppScreen::Invoices => {
                if let Some(state) = &mut app_state.invoices_state {
                    render_invoices(f, state);
                }
            }
            AppScreen::InvoiceWizard(_) => {
                if let Some(state) = &mut app_state.wizard_state {
                    render_invoice_wizard(f, state);
                }
            }
        })?;

        // Handle input for current screen
        let should_quit = match app_state.screen {
            AppScreen::Invoices => handle_invoices_screen(app_state).await?,
            AppScreen::InvoiceWizard(_) => handle_wizard_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

/// Read a listing page through the cache; a miss fetches the rows and the
/// page count and fills the cache for the next read.
async fn fetch_listing(app_state: &AppState, params: &ListingQuery) -> Result<Listing> {
    let key = ListingKey {
        query: params.query_str().to_string(),
        page: params.page,
    };

    if let Some(listing) = app_state.cache.get(&key) {
        return Ok(listing);
    }

    let rows = app_state
        .db
        .list_invoices(params.query_str(), params.page)
        .await?;
    let total_pages = app_state.db.count_invoice_pages(params.query_str()).await?;

    let listing = Listing { rows, total_pages };
    app_state.cache.put(key, listing.clone());

    Ok(listing)
}

async fn load_invoices_screen(app_state: &mut AppState, params: ListingQuery) -> Result<()> {
    let listing = fetch_listing(app_state, &params).await?;

    app_state.invoices_state = Some(InvoicesState::new(params, listing));
    app_state.screen = AppScreen::Invoices;

    Ok(())
}

/// Re-fetch the listing for the screen's current parameters, keeping the
/// rest of the screen state (search box, selection) intact.
async fn refresh_listing(app_state: &mut AppState) -> Result<()> {
    let params = match &app_state.invoices_state {
        Some(state) => state.params().clone(),
        None => return Ok(()),
    };

    let listing = fetch_listing(app_state, &params).await?;
    if let Some(state) = &mut app_state.invoices_state {
        state.set_listing(listing);
    }

    Ok(())
}

async fn handle_invoices_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.invoices_state {
        Some(state) => handle_invoices_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(InvoiceAction::Exit) => {
            return Ok(true);
        }
        Some(InvoiceAction::NewInvoice) => {
            let customers = app_state.db.get_customers().await?;

            app_state.wizard_state = Some(InvoiceWizardState::new(customers));
            app_state.screen = AppScreen::InvoiceWizard(None);
        }
        Some(InvoiceAction::EditInvoice(invoice_id)) => {
            let invoice = app_state.db.get_invoice(invoice_id).await?;
            let customers = app_state.db.get_customers().await?;

            app_state.wizard_state = Some(InvoiceWizardState::from_existing(invoice, customers));
            app_state.screen = AppScreen::InvoiceWizard(Some(invoice_id));
        }
        Some(InvoiceAction::DeleteInvoice(invoice_id)) => {
            // Delete does not redirect; the listing refreshes in place
            // and shows the completion message.
            match actions::delete_invoice(&app_state.db, &app_state.cache, invoice_id).await {
                DeleteOutcome::Deleted { message } => {
                    refresh_listing(app_state).await?;
                    if let Some(state) = &mut app_state.invoices_state {
                        state.set_status(message);
                    }
                }
                DeleteOutcome::Failed { message } => {
                    if let Some(state) = &mut app_state.invoices_state {
                        state.set_status(message);
                    }
                }
            }
        }
        Some(InvoiceAction::ParamsChanged) => {
            refresh_listing(app_state).await?;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.wizard_state {
        Some(state) => handle_wizard_input(state)?,
        None => return Ok(false),
    };

    match action {
        Some(InvoiceWizardAction::Cancel) => {
            app_state.wizard_state = None;
            load_invoices_screen(app_state, ListingQuery::default()).await?;
        }
        Some(InvoiceWizardAction::Submit(form)) => {
            let outcome = match app_state.screen {
                AppScreen::InvoiceWizard(Some(invoice_id)) => {
                    actions::update_invoice(&app_state.db, &app_state.cache, invoice_id, &form)
                        .await
                }
                _ => actions::create_invoice(&app_state.db, &app_state.cache, &form).await,
            };

            match outcome {
                MutationOutcome::Invalid { errors, message } => {
                    if let Some(state) = &mut app_state.wizard_state {
                        state.set_errors(errors, message);
                    }
                }
                MutationOutcome::Failed { message } => {
                    if let Some(state) = &mut app_state.wizard_state {
                        state.set_message(message);
                    }
                }
                MutationOutcome::Redirect(Route::InvoiceListing) => {
                    // The redirect target re-reads its parameters and
                    // re-fetches through the freshly invalidated cache.
                    app_state.wizard_state = None;
                    load_invoices_screen(app_state, ListingQuery::default()).await?;
                }
            }
        }
        None => {}
    }

    Ok(false)
}
