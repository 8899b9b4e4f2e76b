//! Dialogue catalog
//!
//! Static data the chat engine reasons over: services with their keyword
//! sets, greeting and small-talk tables, complaint keywords, canned messages
//! and the ticket field schema. Loaded once at startup, read-only afterwards.
//!
//! Every top-level section falls back to the built-in content, so a catalog
//! file only needs to carry the sections it replaces.

use std::path::Path;

use concierge_core::{
    FieldDefinition, FieldKind, ServiceDefinition, ServiceOption, TicketFieldSchema,
    SUPPORT_TICKET_OPTION_ID,
};
use serde::{Deserialize, Serialize};

use crate::constants::classifier;
use crate::ConfigError;

/// Complete catalog consumed by the classifier and the stage machine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueCatalog {
    /// Services in declared order; order is the only tie-break
    pub services: Vec<ServiceDefinition>,
    pub greetings: GreetingConfig,
    /// Small-talk table, checked in order
    pub casual: Vec<CasualReply>,
    pub complaint_keywords: Vec<String>,
    pub messages: CatalogMessages,
    pub ticket_schema: TicketFieldSchema,
    /// Utterances with fewer whitespace-separated words get a free-text follow-up
    pub low_information_word_count: usize,
}

/// Greeting keywords and the pool of replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreetingConfig {
    pub keywords: Vec<String>,
    pub responses: Vec<String>,
    pub follow_up: String,
}

/// One row of the small-talk table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualReply {
    pub keywords: Vec<String>,
    pub reply: String,
}

impl CasualReply {
    fn new(keywords: &[&str], reply: &str) -> Self {
        Self {
            keywords: strings(keywords),
            reply: reply.to_string(),
        }
    }
}

/// Canned bot messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogMessages {
    pub welcome: String,
    pub complaint_prompt: String,
    pub support_prompt: String,
    /// Heading of the ticket form directive
    pub form_prompt: String,
    /// `{label}` is replaced by the suggested service label
    pub suggestion_prompt: String,
    pub clarification_prompt: String,
    pub low_information_prompt: String,
    pub support_option_label: String,
    pub support_option_description: String,
    /// Sent for typed text once the conversation has been routed
    pub follow_up_message: String,
    pub ticket_success: String,
    /// `{ticket_id}` is replaced by the generated id
    pub ticket_confirmation: String,
    pub submission_error: String,
}

impl Default for CatalogMessages {
    fn default() -> Self {
        Self {
            welcome: "Hi there! I'm the Buster & Co. assistant. Ask me about demos, modules or licensing, or tell me what you need help with.".to_string(),
            complaint_prompt: "I'm really sorry you're running into trouble. Let's get this to our support team right away and we'll prioritise your ticket.".to_string(),
            support_prompt: "No problem. Tell us a little about what you need and our team will get back to you.".to_string(),
            form_prompt: "Fill in the details below and we'll be in touch as soon as possible.".to_string(),
            suggestion_prompt: "It sounds like you might be interested in {label}. Is that right, or were you looking for something else?".to_string(),
            clarification_prompt: "I want to make sure I point you in the right direction. Which of these best describes what you're looking for?".to_string(),
            low_information_prompt: "Could you tell me a bit more about what you're looking for?".to_string(),
            support_option_label: "Something else / contact support".to_string(),
            support_option_description: "Open a support ticket with our team".to_string(),
            follow_up_message: "Is there anything else I can help you with? You can start over at any time to ask about something new.".to_string(),
            ticket_success: "Thanks! Your ticket has been submitted and our team will be in touch shortly.".to_string(),
            ticket_confirmation: "Your ticket ID is {ticket_id}.".to_string(),
            submission_error: "We couldn't submit your ticket. Please try again or contact us directly.".to_string(),
        }
    }
}

impl CatalogMessages {
    pub fn suggestion_prompt_for(&self, label: &str) -> String {
        self.suggestion_prompt.replace("{label}", label)
    }

    pub fn ticket_confirmation_for(&self, ticket_id: &str) -> String {
        self.ticket_confirmation.replace("{ticket_id}", ticket_id)
    }
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            keywords: strings(&[
                "hello",
                "hi",
                "hey",
                "good morning",
                "good afternoon",
                "good evening",
                "greetings",
                "howdy",
            ]),
            responses: strings(&[
                "Hello! Great to have you here.",
                "Hi there! Thanks for stopping by.",
                "Hey! Welcome to Buster & Co.",
                "Hello and welcome!",
            ]),
            follow_up: "What can I help you with today? I can help you book a demo, explore our modules or sort out licensing.".to_string(),
        }
    }
}

impl Default for DialogueCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DialogueCatalog {
    /// Built-in catalog content
    pub fn builtin() -> Self {
        Self {
            services: builtin_services(),
            greetings: GreetingConfig::default(),
            casual: vec![
                CasualReply::new(
                    &["how are you"],
                    "I'm doing great, thanks for asking! How can I help you today?",
                ),
                CasualReply::new(
                    &["thanks", "thank you"],
                    "You're very welcome! Anything else I can do for you?",
                ),
                CasualReply::new(
                    &["who are you"],
                    "I'm the Buster & Co. virtual assistant. I can point you to demos, modules, licensing or our support team.",
                ),
                CasualReply::new(
                    &["what can you do"],
                    "I can help you book a demo, learn about our modules, sort out licensing, or open a support ticket.",
                ),
                CasualReply::new(
                    &["bye", "goodbye"],
                    "Thanks for chatting! Come back any time.",
                ),
            ],
            complaint_keywords: strings(&[
                "broken",
                "not working",
                "doesn't work",
                "bug",
                "error",
                "crash",
                "crashed",
                "frustrated",
                "angry",
                "terrible",
                "awful",
                "complaint",
                "refund",
                "disappointed",
                "issue",
                "problem",
            ]),
            messages: CatalogMessages::default(),
            ticket_schema: builtin_ticket_schema(),
            low_information_word_count: classifier::LOW_INFORMATION_WORD_COUNT,
        }
    }

    /// Load a catalog file, picking the format from the extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let catalog = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            "toml" => Self::from_toml_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(
            path = %path.display(),
            services = catalog.services.len(),
            "Loaded dialogue catalog"
        );

        Ok(catalog)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Look up a service by id
    pub fn service(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.id == id)
    }

    /// The "something else" option that opens a support ticket
    pub fn support_option(&self) -> ServiceOption {
        ServiceOption::new(SUPPORT_TICKET_OPTION_ID, &self.messages.support_option_label)
            .with_description(&self.messages.support_option_description)
    }

    /// Every service in declared order, followed by the support option
    pub fn all_options(&self) -> Vec<ServiceOption> {
        self.services
            .iter()
            .map(ServiceDefinition::option)
            .chain(std::iter::once(self.support_option()))
            .collect()
    }
}

fn builtin_services() -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition {
            id: "demo".to_string(),
            label: "Book a demo".to_string(),
            description: "See the platform in action with a guided walkthrough".to_string(),
            definitive_keywords: strings(&["schedule demo", "book a demo", "book demo", "request demo"]),
            supportive_keywords: strings(&["demo", "platform", "trial", "walkthrough", "presentation"]),
            min_keyword_matches: 1,
            confirmation_message: "Great choice! A live demo is the best way to see what we can do for your business.".to_string(),
            action_message: "Click below to pick a time that works for you and we'll take care of the rest.".to_string(),
            redirect_target: "/booking".to_string(),
            button_text: "Schedule a demo".to_string(),
        },
        ServiceDefinition {
            id: "modules".to_string(),
            label: "Explore modules".to_string(),
            description: "Browse the modules and integrations available for your plan".to_string(),
            definitive_keywords: strings(&[
                "module pricing",
                "which modules",
                "available modules",
                "list modules",
                "feature list",
            ]),
            supportive_keywords: strings(&[
                "module",
                "modules",
                "feature",
                "features",
                "integration",
                "integrations",
                "add-on",
                "capabilities",
            ]),
            min_keyword_matches: 2,
            confirmation_message: "Our modules let you tailor the platform to exactly what your team needs.".to_string(),
            action_message: "Take a look at the full module catalogue to see what fits.".to_string(),
            redirect_target: "/pricing#modules".to_string(),
            button_text: "View modules".to_string(),
        },
        ServiceDefinition {
            id: "licensing".to_string(),
            label: "Licensing & pricing".to_string(),
            description: "Plans, seats and enterprise licensing".to_string(),
            definitive_keywords: strings(&[
                "license key",
                "buy license",
                "licensing",
                "enterprise license",
                "purchase license",
            ]),
            supportive_keywords: strings(&[
                "license",
                "licence",
                "pricing",
                "price",
                "cost",
                "subscription",
                "plan",
                "billing",
                "seats",
            ]),
            min_keyword_matches: 1,
            confirmation_message: "Happy to help with licensing. We have plans for teams of every size.".to_string(),
            action_message: "Compare our plans and choose the licence that suits you best.".to_string(),
            redirect_target: "/pricing".to_string(),
            button_text: "See pricing".to_string(),
        },
    ]
}

fn builtin_ticket_schema() -> TicketFieldSchema {
    TicketFieldSchema::new(vec![
        FieldDefinition::new("name", "Name", FieldKind::Text)
            .required()
            .with_placeholder("Your full name"),
        FieldDefinition::new("email", "Email", FieldKind::Email)
            .required()
            .with_placeholder("you@company.com"),
        FieldDefinition::new("company", "Company", FieldKind::Text)
            .with_placeholder("Company name (optional)"),
        FieldDefinition::new(
            "topic",
            "Topic",
            FieldKind::Select {
                options: strings(&[
                    "General question",
                    "Technical support",
                    "Billing",
                    "Sales",
                    "Partnership",
                ]),
            },
        )
        .required(),
        FieldDefinition::new("message", "Message", FieldKind::TextArea)
            .required()
            .with_placeholder("How can we help?"),
    ])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog() {
        let catalog = DialogueCatalog::builtin();
        let ids: Vec<_> = catalog.services.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["demo", "modules", "licensing"]);

        let demo = catalog.service("demo").unwrap();
        assert!(demo.definitive_keywords.contains(&"schedule demo".to_string()));
        assert!(demo.supportive_keywords.contains(&"platform".to_string()));
        assert_eq!(demo.min_keyword_matches, 1);

        assert!(catalog.ticket_schema.field("email").unwrap().required);
        assert!(!catalog.ticket_schema.field("company").unwrap().required);
        assert_eq!(catalog.low_information_word_count, 5);
    }

    #[test]
    fn test_all_options_end_with_support() {
        let catalog = DialogueCatalog::builtin();
        let options = catalog.all_options();
        assert_eq!(options.len(), catalog.services.len() + 1);
        assert!(options.last().unwrap().is_support_ticket());
        assert_eq!(options[0].id, "demo");
    }

    #[test]
    fn test_message_templates() {
        let messages = CatalogMessages::default();
        assert_eq!(
            messages.ticket_confirmation_for("TCKABC123XYZ"),
            "Your ticket ID is TCKABC123XYZ."
        );
        assert!(messages.suggestion_prompt_for("Book a demo").contains("Book a demo"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
complaint_keywords:
  - broken
  - outage
low_information_word_count: 3
"#;
        let catalog = DialogueCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.complaint_keywords, vec!["broken", "outage"]);
        assert_eq!(catalog.low_information_word_count, 3);
        assert_eq!(catalog.services.len(), 3);
        assert_eq!(catalog.messages, CatalogMessages::default());
    }

    #[test]
    fn test_partial_greetings_keep_defaults() {
        let yaml = r#"
greetings:
  keywords:
    - hello
    - bonjour
"#;
        let catalog = DialogueCatalog::from_yaml_str(yaml).unwrap();
        let defaults = GreetingConfig::default();
        assert_eq!(catalog.greetings.keywords, vec!["hello", "bonjour"]);
        assert_eq!(catalog.greetings.responses, defaults.responses);
        assert_eq!(catalog.greetings.follow_up, defaults.follow_up);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("catalog.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"messages": {{"welcome": "Welcome aboard"}}}}"#).unwrap();
        let catalog = DialogueCatalog::load(&json_path).unwrap();
        assert_eq!(catalog.messages.welcome, "Welcome aboard");
        assert_eq!(
            catalog.messages.submission_error,
            CatalogMessages::default().submission_error
        );

        let toml_path = dir.path().join("catalog.toml");
        std::fs::write(&toml_path, "low_information_word_count = 4\n").unwrap();
        let catalog = DialogueCatalog::load(&toml_path).unwrap();
        assert_eq!(catalog.low_information_word_count, 4);

        let txt_path = dir.path().join("catalog.txt");
        std::fs::write(&txt_path, "").unwrap();
        assert!(matches!(
            DialogueCatalog::load(&txt_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = DialogueCatalog::load("/nonexistent/catalog.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
