//! Support ticket validation
//!
//! Schema-driven: every declared field is checked in order and all
//! violations are collected.

use std::sync::Arc;

use concierge_core::{FieldKind, SupportTicketForm, TicketFieldSchema, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// `local@domain.tld`, no whitespace
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// Validates ticket forms against the catalog field schema
#[derive(Debug, Clone)]
pub struct TicketValidator {
    schema: Arc<TicketFieldSchema>,
}

impl TicketValidator {
    pub fn new(schema: Arc<TicketFieldSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &TicketFieldSchema {
        &self.schema
    }

    pub fn validate(&self, form: &SupportTicketForm) -> ValidationResult {
        let mut errors = Vec::new();

        for field in &self.schema.fields {
            let value = form.value(&field.name).map(str::trim).unwrap_or("");

            if value.is_empty() {
                if field.required {
                    errors.push(format!("{} is required", field.label));
                }
                continue;
            }

            match &field.kind {
                FieldKind::Select { options } if !options.iter().any(|o| o == value) => {
                    errors.push(format!("Please select a valid {}", field.label.to_lowercase()));
                }
                _ if (field.kind == FieldKind::Email || field.name == "email")
                    && !is_valid_email(value) =>
                {
                    errors.push(INVALID_EMAIL_MESSAGE.to_string());
                }
                _ => {}
            }
        }

        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "Ticket form failed validation");
        }

        ValidationResult::from_errors(errors)
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}
