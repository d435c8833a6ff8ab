use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// The two states an invoice can be in. Nothing else may persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<InvoiceStatus> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

/// A stored invoice. `amount` is integer cents.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// Listing projection: an invoice joined with its customer's name.
#[derive(Debug, Clone)]
pub struct InvoiceRow {
    pub id: i64,
    pub customer_name: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

fn status_from_row(row: &PgRow) -> Result<InvoiceStatus, sqlx::Error> {
    let raw: String = row.try_get("status")?;
    InvoiceStatus::parse(&raw).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "status".into(),
        source: format!("unknown invoice status {raw:?}").into(),
    })
}

impl<'r> FromRow<'r, PgRow> for Invoice {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Invoice {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            amount: row.try_get("amount")?,
            status: status_from_row(row)?,
            date: row.try_get("date")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for InvoiceRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(InvoiceRow {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            amount: row.try_get("amount")?,
            status: status_from_row(row)?,
            date: row.try_get("date")?,
        })
    }
}

/// Render stored cents as dollars, e.g. 1234 -> "$12.34".
pub fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!(InvoiceStatus::parse("pending"), Some(InvoiceStatus::Pending));
        assert_eq!(InvoiceStatus::parse("paid"), Some(InvoiceStatus::Paid));
        assert_eq!(InvoiceStatus::Pending.as_str(), "pending");
        assert_eq!(InvoiceStatus::Paid.as_str(), "paid");
    }

    #[test]
    fn status_rejects_anything_else() {
        assert_eq!(InvoiceStatus::parse("Paid"), None);
        assert_eq!(InvoiceStatus::parse("overdue"), None);
        assert_eq!(InvoiceStatus::parse(""), None);
    }

    #[test]
    fn cents_format_as_dollars() {
        assert_eq!(format_cents(1234), "$12.34");
        assert_eq!(format_cents(1000), "$10.00");
        assert_eq!(format_cents(5), "$0.05");
    }
}
