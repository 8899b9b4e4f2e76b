//! Service catalog entries
//!
//! A `ServiceDefinition` is static data: it is loaded once from the catalog
//! file (or the built-in default) and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Option id that routes the user to the support ticket form instead of a service
pub const SUPPORT_TICKET_OPTION_ID: &str = "support_ticket";

/// A service the chat widget can route a visitor to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Unique slug (e.g. "demo", "modules", "licensing")
    pub id: String,
    pub label: String,
    pub description: String,
    /// Any one of these resolves the utterance to this service
    pub definitive_keywords: Vec<String>,
    /// Weaker signals, counted against `min_keyword_matches`
    pub supportive_keywords: Vec<String>,
    #[serde(default = "default_min_keyword_matches")]
    pub min_keyword_matches: usize,
    pub confirmation_message: String,
    pub action_message: String,
    /// Client-side route the host navigates to; the engine never navigates itself
    pub redirect_target: String,
    pub button_text: String,
}

fn default_min_keyword_matches() -> usize {
    1
}

impl ServiceDefinition {
    /// Selectable option shown in clarification menus
    pub fn option(&self) -> ServiceOption {
        ServiceOption {
            id: self.id.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
        }
    }
}

/// Entry of a clarification menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl ServiceOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether this option is the support ticket sentinel
    pub fn is_support_ticket(&self) -> bool {
        self.id == SUPPORT_TICKET_OPTION_ID
    }
}
