use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::models::InvoiceStatus;

pub mod schema;

use schema::{parse_invoice_form, FieldErrors, FormData};

/// Where a successful create/update sends the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    InvoiceListing,
}

/// Persistence failure at the store boundary. The cause is logged but
/// callers only ever see the generic per-operation message.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Column values for an insert. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// The editable columns. `id` and `date` are not among them, so an
/// update cannot touch either.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceChanges {
    pub customer_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
}

/// Parameterized insert/update/delete against the invoice table.
#[async_trait]
pub trait InvoiceStore {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64, StoreError>;
    async fn update_invoice(&self, id: i64, changes: &InvoiceChanges) -> Result<(), StoreError>;
    async fn delete_invoice(&self, id: i64) -> Result<(), StoreError>;
}

/// Cache invalidation signal: the listing's cached output, if any, must
/// be discarded and recomputed on next read.
pub trait ListingNotifier {
    fn listing_changed(&self);
}

/// Result of a create/update submission.
#[derive(Debug, PartialEq)]
pub enum MutationOutcome {
    /// Input failed validation; nothing was persisted.
    Invalid { errors: FieldErrors, message: String },
    /// The store rejected the statement; nothing was invalidated.
    Failed { message: String },
    /// Persisted and invalidated; the caller should navigate here.
    Redirect(Route),
}

/// Result of a delete. Delete never redirects; the listing refreshes in
/// place and shows the message.
#[derive(Debug, PartialEq)]
pub enum DeleteOutcome {
    Failed { message: String },
    Deleted { message: String },
}

/// Monetary input is stored as integer cents to avoid floating-point
/// rounding error in storage.
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub async fn create_invoice<S, N>(store: &S, notifier: &N, form: &FormData) -> MutationOutcome
where
    S: InvoiceStore,
    N: ListingNotifier,
{
    let input = match parse_invoice_form(form) {
        Ok(input) => input,
        Err(errors) => {
            return MutationOutcome::Invalid {
                errors,
                message: "Missing Fields. Failed to Create Invoice.".to_string(),
            };
        }
    };

    let invoice = NewInvoice {
        customer_id: input.customer_id,
        amount: amount_to_cents(input.amount),
        status: input.status,
        date: Local::now().date_naive(),
    };

    match store.insert_invoice(&invoice).await {
        Ok(id) => {
            tracing::info!(id, "created invoice");
            notifier.listing_changed();
            MutationOutcome::Redirect(Route::InvoiceListing)
        }
        Err(err) => {
            tracing::error!(%err, "invoice insert failed");
            MutationOutcome::Failed {
                message: "Database Error: Failed to Create Invoice.".to_string(),
            }
        }
    }
}

pub async fn update_invoice<S, N>(
    store: &S,
    notifier: &N,
    id: i64,
    form: &FormData,
) -> MutationOutcome
where
    S: InvoiceStore,
    N: ListingNotifier,
{
    let input = match parse_invoice_form(form) {
        Ok(input) => input,
        Err(errors) => {
            return MutationOutcome::Invalid {
                errors,
                message: "Missing Fields. Failed to Update Invoice.".to_string(),
            };
        }
    };

    let changes = InvoiceChanges {
        customer_id: input.customer_id,
        amount: amount_to_cents(input.amount),
        status: input.status,
    };

    match store.update_invoice(id, &changes).await {
        Ok(()) => {
            tracing::info!(id, "updated invoice");
            notifier.listing_changed();
            MutationOutcome::Redirect(Route::InvoiceListing)
        }
        Err(err) => {
            tracing::error!(%err, id, "invoice update failed");
            MutationOutcome::Failed {
                message: "Database Error: Failed to Update Invoice.".to_string(),
            }
        }
    }
}

pub async fn delete_invoice<S, N>(store: &S, notifier: &N, id: i64) -> DeleteOutcome
where
    S: InvoiceStore,
    N: ListingNotifier,
{
    match store.delete_invoice(id).await {
        Ok(()) => {
            tracing::info!(id, "deleted invoice");
            notifier.listing_changed();
            DeleteOutcome::Deleted {
                message: "Deleted Invoice".to_string(),
            }
        }
        Err(err) => {
            tracing::error!(%err, id, "invoice delete failed");
            DeleteOutcome::Failed {
                message: "Database Error: Failed to Delete Invoice".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemStore {
        inserted: Mutex<Vec<NewInvoice>>,
        updated: Mutex<Vec<(i64, InvoiceChanges)>>,
        deleted: Mutex<Vec<i64>>,
        fail: bool,
    }

    impl MemStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    fn db_down() -> StoreError {
        StoreError::Database(sqlx::Error::PoolClosed)
    }

    #[async_trait]
    impl InvoiceStore for MemStore {
        async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<i64, StoreError> {
            if self.fail {
                return Err(db_down());
            }
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push(invoice.clone());
            Ok(inserted.len() as i64)
        }

        async fn update_invoice(&self, id: i64, changes: &InvoiceChanges) -> Result<(), StoreError> {
            if self.fail {
                return Err(db_down());
            }
            self.updated.lock().unwrap().push((id, changes.clone()));
            Ok(())
        }

        async fn delete_invoice(&self, id: i64) -> Result<(), StoreError> {
            if self.fail {
                return Err(db_down());
            }
            self.deleted.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fired: AtomicUsize,
    }

    impl RecordingNotifier {
        fn count(&self) -> usize {
            self.fired.load(Ordering::SeqCst)
        }
    }

    impl ListingNotifier for RecordingNotifier {
        fn listing_changed(&self) {
            self.fired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn form(customer_id: &str, amount: &str, status: &str) -> FormData {
        let mut form = FormData::new();
        form.set("customer_id", customer_id);
        form.set("amount", amount);
        form.set("status", status);
        form
    }

    #[test]
    fn amounts_convert_to_rounded_cents() {
        assert_eq!(amount_to_cents(12.34), 1234);
        assert_eq!(amount_to_cents(10.0), 1000);
        assert_eq!(amount_to_cents(0.005), 1);
    }

    #[tokio::test]
    async fn create_persists_cents_invalidates_and_redirects() {
        let store = MemStore::default();
        let notifier = RecordingNotifier::default();

        let outcome = create_invoice(&store, &notifier, &form("c1", "10", "pending")).await;

        assert_eq!(outcome, MutationOutcome::Redirect(Route::InvoiceListing));
        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].customer_id, "c1");
        assert_eq!(inserted[0].amount, 1000);
        assert_eq!(inserted[0].status, InvoiceStatus::Pending);
        assert_eq!(inserted[0].date, Local::now().date_naive());
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn invalid_create_never_reaches_the_store() {
        let store = MemStore::default();
        let notifier = RecordingNotifier::default();

        let outcome = create_invoice(&store, &notifier, &form("c1", "0", "pending")).await;

        match outcome {
            MutationOutcome::Invalid { errors, message } => {
                assert_eq!(message, "Missing Fields. Failed to Create Invoice.");
                assert_eq!(errors.get("amount"), ["Please enter an amount greater than $0."]);
                assert!(errors.get("customer_id").is_empty());
                assert!(errors.get("status").is_empty());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(store.inserted.lock().unwrap().is_empty());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn failed_insert_reports_the_generic_message() {
        let store = MemStore::failing();
        let notifier = RecordingNotifier::default();

        let outcome = create_invoice(&store, &notifier, &form("c1", "10", "paid")).await;

        assert_eq!(
            outcome,
            MutationOutcome::Failed {
                message: "Database Error: Failed to Create Invoice.".to_string(),
            }
        );
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn update_touches_only_the_editable_columns() {
        let store = MemStore::default();
        let notifier = RecordingNotifier::default();

        let outcome = update_invoice(&store, &notifier, 7, &form("c2", "12.34", "paid")).await;

        assert_eq!(outcome, MutationOutcome::Redirect(Route::InvoiceListing));
        let updated = store.updated.lock().unwrap();
        assert_eq!(
            *updated,
            [(
                7,
                InvoiceChanges {
                    customer_id: "c2".to_string(),
                    amount: 1234,
                    status: InvoiceStatus::Paid,
                }
            )]
        );
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn invalid_update_uses_the_update_summary() {
        let store = MemStore::default();
        let notifier = RecordingNotifier::default();

        let outcome = update_invoice(&store, &notifier, 7, &form("", "5", "paid")).await;

        match outcome {
            MutationOutcome::Invalid { message, .. } => {
                assert_eq!(message, "Missing Fields. Failed to Update Invoice.");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(store.updated.lock().unwrap().is_empty());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn delete_invalidates_and_reports_completion() {
        let store = MemStore::default();
        let notifier = RecordingNotifier::default();

        let outcome = delete_invoice(&store, &notifier, 3).await;

        assert_eq!(
            outcome,
            DeleteOutcome::Deleted {
                message: "Deleted Invoice".to_string(),
            }
        );
        assert_eq!(*store.deleted.lock().unwrap(), [3]);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_cache_alone() {
        let store = MemStore::failing();
        let notifier = RecordingNotifier::default();

        let outcome = delete_invoice(&store, &notifier, 3).await;

        assert_eq!(
            outcome,
            DeleteOutcome::Failed {
                message: "Database Error: Failed to Delete Invoice".to_string(),
            }
        );
        assert_eq!(notifier.count(), 0);
    }
}
