mod customer;
mod invoice;

pub use customer::Customer;
pub use invoice::{format_cents, Invoice, InvoiceRow, InvoiceStatus};
