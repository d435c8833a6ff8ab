use std::collections::BTreeMap;

use crate::models::InvoiceStatus;

/// A raw form submission: field name -> raw string value, exactly as the
/// form widgets produced it. Coercion happens in [`parse_invoice_form`],
/// never in the UI layer.
#[derive(Debug, Default, Clone)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Field name -> error messages. A field without an entry has no error.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: &str) {
        self.errors.entry(field).or_default().push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        self.errors.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }
}

/// The coerced, validated invoice payload. `amount` is still in display
/// currency units; the handlers convert to cents.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceInput {
    pub customer_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

/// Coerce and check a raw invoice form.
///
/// Rules:
/// - `customer_id`: present and non-empty
/// - `amount`: parses as a finite number strictly greater than zero
/// - `status`: exactly `pending` or `paid`
///
/// All failures come back as field-keyed messages; this never panics and
/// never short-circuits on the first bad field.
pub fn parse_invoice_form(form: &FormData) -> Result<InvoiceInput, FieldErrors> {
    let mut errors = FieldErrors::default();

    let customer_id = match form.get("customer_id") {
        Some(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        _ => {
            errors.push("customer_id", "Please select a customer");
            None
        }
    };

    // "NaN" parses as a float in Rust, so finiteness is checked alongside
    // the > 0 rule; every amount failure gets the same message.
    let amount = match form.get("amount").and_then(|raw| raw.trim().parse::<f64>().ok()) {
        Some(amount) if amount.is_finite() && amount > 0.0 => Some(amount),
        _ => {
            errors.push("amount", "Please enter an amount greater than $0.");
            None
        }
    };

    let status = match form.get("status").and_then(InvoiceStatus::parse) {
        Some(status) => Some(status),
        None => {
            errors.push("status", "Please select an invoice status");
            None
        }
    };

    match (customer_id, amount, status) {
        (Some(customer_id), Some(amount), Some(status)) => Ok(InvoiceInput {
            customer_id,
            amount,
            status,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(customer_id: &str, amount: &str, status: &str) -> FormData {
        let mut form = FormData::new();
        form.set("customer_id", customer_id);
        form.set("amount", amount);
        form.set("status", status);
        form
    }

    #[test]
    fn valid_form_yields_the_coerced_triple() {
        let input = parse_invoice_form(&form("c1", "12.34", "pending")).unwrap();
        assert_eq!(
            input,
            InvoiceInput {
                customer_id: "c1".to_string(),
                amount: 12.34,
                status: InvoiceStatus::Pending,
            }
        );
    }

    #[test]
    fn missing_customer_flags_only_that_field() {
        let errors = parse_invoice_form(&form("", "12.34", "paid")).unwrap_err();
        assert_eq!(errors.get("customer_id"), ["Please select a customer"]);
        assert!(errors.get("amount").is_empty());
        assert!(errors.get("status").is_empty());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let errors = parse_invoice_form(&form("c1", "0", "paid")).unwrap_err();
        assert_eq!(errors.get("amount"), ["Please enter an amount greater than $0."]);
        assert!(errors.get("customer_id").is_empty());
        assert!(errors.get("status").is_empty());
    }

    #[test]
    fn non_numeric_and_nan_amounts_are_rejected() {
        for bad in ["", "abc", "NaN", "-3", "inf"] {
            let errors = parse_invoice_form(&form("c1", bad, "paid")).unwrap_err();
            assert_eq!(
                errors.get("amount"),
                ["Please enter an amount greater than $0."],
                "amount {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_status_flags_only_that_field() {
        let errors = parse_invoice_form(&form("c1", "5", "overdue")).unwrap_err();
        assert_eq!(errors.get("status"), ["Please select an invoice status"]);
        assert!(errors.get("customer_id").is_empty());
        assert!(errors.get("amount").is_empty());
    }

    #[test]
    fn empty_form_reports_all_three_fields() {
        let errors = parse_invoice_form(&FormData::new()).unwrap_err();
        assert_eq!(errors.iter().count(), 3);
    }
}
