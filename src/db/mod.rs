use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::actions::{InvoiceChanges, InvoiceStore, NewInvoice, StoreError};
use crate::config::Config;
use crate::models::{Customer, Invoice, InvoiceRow};

/// Rows shown per listing page.
pub const ITEMS_PER_PAGE: u32 = 6;

const LISTING_FILTER: &str = r#"
    customers.name ILIKE $1 OR
    invoices.amount::text ILIKE $1 OR
    invoices.date::text ILIKE $1 OR
    invoices.status ILIKE $1
"#;

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// One page of the listing, joined with customer names. The filter is
    /// a case-insensitive substring match against customer name, amount,
    /// date, and status.
    pub async fn list_invoices(&self, query: &str, page: u32) -> Result<Vec<InvoiceRow>> {
        let offset = (page.max(1) - 1) * ITEMS_PER_PAGE;
        let pattern = format!("%{query}%");

        let sql = format!(
            r#"
            SELECT
                invoices.id,
                customers.name AS customer_name,
                invoices.amount,
                invoices.status,
                invoices.date
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE {LISTING_FILTER}
            ORDER BY invoices.date DESC, invoices.id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(&pattern)
            .bind(ITEMS_PER_PAGE as i64)
            .bind(offset as i64)
            .fetch_all(self.get_pool())
            .await?;

        Ok(rows)
    }

    /// Page count for a query, for the pagination control.
    pub async fn count_invoice_pages(&self, query: &str) -> Result<u32> {
        let pattern = format!("%{query}%");

        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE {LISTING_FILTER}
            "#
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(&pattern)
            .fetch_one(self.get_pool())
            .await?;

        Ok((count as u32).div_ceil(ITEMS_PER_PAGE))
    }

    pub async fn get_invoice(&self, id: i64) -> Result<Invoice> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT id, customer_id, amount, status, date FROM invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(invoice)
    }

    pub async fn get_customers(&self) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>("SELECT id, name FROM customers ORDER BY name ASC")
            .fetch_all(self.get_pool())
            .await?;

        Ok(customers)
    }
}

#[async_trait::async_trait]
impl InvoiceStore for Database {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (customer_id, amount, status, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&invoice.customer_id)
        .bind(invoice.amount)
        .bind(invoice.status.as_str())
        .bind(invoice.date)
        .fetch_one(self.get_pool())
        .await?;

        Ok(id)
    }

    // `date` and `id` are deliberately absent from the statement.
    async fn update_invoice(&self, id: i64, changes: &InvoiceChanges) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = $1, amount = $2, status = $3
            WHERE id = $4
            "#,
        )
        .bind(&changes.customer_id)
        .bind(changes.amount)
        .bind(changes.status.as_str())
        .bind(id)
        .execute(self.get_pool())
        .await?;

        Ok(())
    }

    async fn delete_invoice(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        Ok(())
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    tracing::debug!("database connection pool ready");

    Ok(db)
}
