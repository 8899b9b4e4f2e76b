//! Catalog validator
//!
//! Checks a loaded `DialogueCatalog` at startup so keyword mistakes surface
//! before the first visitor does. Performs:
//! - Keyword set checks (non-empty, lower-case)
//! - Duplicate id detection
//! - Definitive/supportive overlap per service
//! - Ticket schema completeness
//!
//! # Example
//!
//! ```ignore
//! use concierge_config::{CatalogValidator, DialogueCatalog};
//!
//! let report = CatalogValidator::new().validate(&DialogueCatalog::builtin());
//! assert!(report.is_ok());
//! ```

use std::collections::HashSet;

use concierge_core::{FieldKind, SUPPORT_TICKET_OPTION_ID};

use crate::catalog::DialogueCatalog;

/// A single finding with context
#[derive(Debug, Clone)]
pub struct CatalogIssue {
    pub category: IssueCategory,
    /// Catalog section (e.g. `services.demo`, `ticket_schema`)
    pub source: String,
    pub field: Option<String>,
    pub message: String,
    pub severity: IssueSeverity,
}

impl std::fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field_str = self.field.as_deref().unwrap_or("(root)");
        write!(
            f,
            "[{:?}] {}/{}: {}",
            self.severity, self.source, field_str, self.message
        )
    }
}

impl std::error::Error for CatalogIssue {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCategory {
    /// Missing required content
    MissingRequired,
    /// Value out of expected range
    ValueOutOfRange,
    /// Duplicate definition
    Duplicate,
    /// Keyword formatting or overlap
    Keyword,
    /// Schema mismatch
    SchemaMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    /// Informational warning
    Warning,
    /// Critical - will prevent startup
    Critical,
}

/// Outcome of validating a catalog
#[derive(Debug, Default)]
pub struct CatalogReport {
    pub issues: Vec<CatalogIssue>,
}

impl CatalogReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_critical(
        &mut self,
        category: IssueCategory,
        source: &str,
        field: Option<&str>,
        message: impl Into<String>,
    ) {
        self.issues.push(CatalogIssue {
            category,
            source: source.to_string(),
            field: field.map(str::to_string),
            message: message.into(),
            severity: IssueSeverity::Critical,
        });
    }

    pub fn add_warning(
        &mut self,
        category: IssueCategory,
        source: &str,
        field: Option<&str>,
        message: impl Into<String>,
    ) {
        self.issues.push(CatalogIssue {
            category,
            source: source.to_string(),
            field: field.map(str::to_string),
            message: message.into(),
            severity: IssueSeverity::Warning,
        });
    }

    /// Check if validation passed (no critical issues)
    pub fn is_ok(&self) -> bool {
        self.critical_count() == 0
    }

    pub fn critical_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Critical)
            .count()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CatalogIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
    }

    /// Log every issue at a level matching its severity
    pub fn log(&self) {
        for issue in &self.issues {
            match issue.severity {
                IssueSeverity::Critical => tracing::error!(%issue, "Catalog validation failed"),
                IssueSeverity::Warning => tracing::warn!(%issue, "Catalog validation warning"),
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogValidator;

impl CatalogValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, catalog: &DialogueCatalog) -> CatalogReport {
        let mut report = CatalogReport::new();

        self.validate_services(catalog, &mut report);
        self.validate_tables(catalog, &mut report);
        self.validate_schema(catalog, &mut report);

        if catalog.low_information_word_count == 0 {
            report.add_warning(
                IssueCategory::ValueOutOfRange,
                "catalog",
                Some("low_information_word_count"),
                "Zero disables the free-text follow-up prompt",
            );
        }

        report
    }

    fn validate_services(&self, catalog: &DialogueCatalog, report: &mut CatalogReport) {
        if catalog.services.is_empty() {
            report.add_critical(
                IssueCategory::MissingRequired,
                "services",
                None,
                "At least one service is required",
            );
        }

        let mut seen = HashSet::new();
        for service in &catalog.services {
            let source = format!("services.{}", service.id);

            if service.id.trim().is_empty() {
                report.add_critical(IssueCategory::MissingRequired, "services", Some("id"), "Service id is empty");
            }
            if !seen.insert(service.id.as_str()) {
                report.add_critical(
                    IssueCategory::Duplicate,
                    &source,
                    Some("id"),
                    format!("Duplicate service id '{}'", service.id),
                );
            }
            if service.id == SUPPORT_TICKET_OPTION_ID {
                report.add_critical(
                    IssueCategory::Duplicate,
                    &source,
                    Some("id"),
                    "Service id shadows the support ticket option",
                );
            }

            check_keywords(report, &source, "definitive_keywords", &service.definitive_keywords);
            check_keywords(report, &source, "supportive_keywords", &service.supportive_keywords);

            for keyword in &service.definitive_keywords {
                if service.supportive_keywords.contains(keyword) {
                    report.add_critical(
                        IssueCategory::Keyword,
                        &source,
                        Some("supportive_keywords"),
                        format!("'{}' is both definitive and supportive", keyword),
                    );
                }
            }

            if service.min_keyword_matches == 0 {
                report.add_critical(
                    IssueCategory::ValueOutOfRange,
                    &source,
                    Some("min_keyword_matches"),
                    "Must be at least 1",
                );
            } else if service.min_keyword_matches > service.supportive_keywords.len() {
                report.add_warning(
                    IssueCategory::ValueOutOfRange,
                    &source,
                    Some("min_keyword_matches"),
                    "Threshold exceeds the number of supportive keywords; service can never be suggested",
                );
            }

            if service.redirect_target.trim().is_empty() {
                report.add_warning(
                    IssueCategory::MissingRequired,
                    &source,
                    Some("redirect_target"),
                    "No redirect target",
                );
            }
        }
    }

    fn validate_tables(&self, catalog: &DialogueCatalog, report: &mut CatalogReport) {
        check_keywords(report, "greetings", "keywords", &catalog.greetings.keywords);
        if catalog.greetings.responses.is_empty() {
            report.add_critical(
                IssueCategory::MissingRequired,
                "greetings",
                Some("responses"),
                "Greeting response pool is empty",
            );
        }

        for (index, row) in catalog.casual.iter().enumerate() {
            check_keywords(report, &format!("casual[{}]", index), "keywords", &row.keywords);
        }

        check_keywords(report, "catalog", "complaint_keywords", &catalog.complaint_keywords);
    }

    fn validate_schema(&self, catalog: &DialogueCatalog, report: &mut CatalogReport) {
        let schema = &catalog.ticket_schema;
        if schema.fields.is_empty() {
            report.add_critical(
                IssueCategory::MissingRequired,
                "ticket_schema",
                None,
                "Ticket schema declares no fields",
            );
            return;
        }

        let mut seen = HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                report.add_critical(
                    IssueCategory::Duplicate,
                    "ticket_schema",
                    Some(field.name.as_str()),
                    "Duplicate field",
                );
            }
            if field.label.trim().is_empty() {
                report.add_warning(
                    IssueCategory::MissingRequired,
                    "ticket_schema",
                    Some(field.name.as_str()),
                    "Empty label produces unreadable validation messages",
                );
            }
            if let FieldKind::Select { options } = &field.kind {
                if options.is_empty() {
                    report.add_critical(
                        IssueCategory::SchemaMismatch,
                        "ticket_schema",
                        Some(field.name.as_str()),
                        "Select field has no options",
                    );
                }
            }
        }

        match schema.field("email") {
            Some(email) if email.kind != FieldKind::Email => report.add_critical(
                IssueCategory::SchemaMismatch,
                "ticket_schema",
                Some("email"),
                "The email field must use the email kind",
            ),
            Some(_) => {}
            None => report.add_warning(
                IssueCategory::MissingRequired,
                "ticket_schema",
                Some("email"),
                "No email field; the team cannot reply to tickets",
            ),
        }
    }
}

fn check_keywords(report: &mut CatalogReport, source: &str, field: &str, keywords: &[String]) {
    if keywords.is_empty() {
        report.add_critical(IssueCategory::MissingRequired, source, Some(field), "Keyword set is empty");
        return;
    }

    for keyword in keywords {
        if keyword.trim().is_empty() {
            report.add_critical(IssueCategory::Keyword, source, Some(field), "Blank keyword");
        } else if keyword.to_lowercase() != *keyword {
            report.add_critical(
                IssueCategory::Keyword,
                source,
                Some(field),
                format!("'{}' is not lower-case", keyword),
            );
        }
    }
}
