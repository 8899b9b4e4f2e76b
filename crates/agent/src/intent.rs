//! Intent Classification
//!
//! Maps a free-text utterance to exactly one `Classification` by ordered
//! keyword rules:
//!
//! 1. Greeting
//! 2. Casual small talk
//! 3. Complaint
//! 4. Definitive service match (first service in declared order)
//! 5. Suggestion (supportive keyword count reaches the service threshold)
//! 6. Clarification (menu, or free-text follow-up for short utterances)
//!
//! Keywords match on Unicode word boundaries: `hi` matches "hi there" but
//! not "this". Multi-word keywords must appear as a contiguous word run.

use std::sync::Arc;

use concierge_config::DialogueCatalog;
use concierge_core::{ServiceDefinition, ServiceOption};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Outcome label, used for logging and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    Casual,
    Complaint,
    Definitive,
    Suggestion,
    Clarification,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Greeting => "greeting",
            IntentKind::Casual => "casual",
            IntentKind::Complaint => "complaint",
            IntentKind::Definitive => "definitive",
            IntentKind::Suggestion => "suggestion",
            IntentKind::Clarification => "clarification",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Classification {
    /// Stage unchanged
    Greeting { message: String, follow_up: String },
    /// Stage unchanged
    Casual { reply: String },
    /// Caller opens a high priority support ticket
    Complaint,
    Definitive { service: ServiceDefinition },
    /// `options` starts with the suggested service and ends with the support option
    Suggestion {
        suggested: ServiceDefinition,
        options: Vec<ServiceOption>,
    },
    /// `options` is empty when `show_options` is false
    Clarification {
        show_options: bool,
        prompt: String,
        options: Vec<ServiceOption>,
    },
}

impl Classification {
    pub fn intent(&self) -> IntentKind {
        match self {
            Classification::Greeting { .. } => IntentKind::Greeting,
            Classification::Casual { .. } => IntentKind::Casual,
            Classification::Complaint => IntentKind::Complaint,
            Classification::Definitive { .. } => IntentKind::Definitive,
            Classification::Suggestion { .. } => IntentKind::Suggestion,
            Classification::Clarification { .. } => IntentKind::Clarification,
        }
    }
}

/// Lower-cased utterance split into words
struct Utterance {
    lowered: String,
    words: Vec<String>,
}

impl Utterance {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let words = tokenize(&lowered);
        Self { lowered, words }
    }

    /// Whether the keyword's word sequence occurs contiguously
    fn contains(&self, keyword: &str) -> bool {
        let needle = tokenize(&keyword.to_lowercase());
        if needle.is_empty() || needle.len() > self.words.len() {
            return false;
        }
        self.words
            .windows(needle.len())
            .any(|window| window == needle.as_slice())
    }

    fn contains_any(&self, keywords: &[String]) -> bool {
        keywords.iter().any(|k| self.contains(k))
    }

    fn count_matches(&self, keywords: &[String]) -> usize {
        keywords.iter().filter(|k| self.contains(k)).count()
    }

    /// Whitespace-separated word count for the low-information heuristic
    fn word_count(&self) -> usize {
        self.lowered.split_whitespace().count()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_string).collect()
}

/// Stateless keyword classifier over a shared catalog
///
/// The random source only picks among greeting replies; seed it for
/// deterministic tests.
pub struct IntentClassifier {
    catalog: Arc<DialogueCatalog>,
    rng: Mutex<StdRng>,
}

impl IntentClassifier {
    pub fn new(catalog: Arc<DialogueCatalog>) -> Self {
        Self::with_rng(catalog, StdRng::from_entropy())
    }

    pub fn with_seed(catalog: Arc<DialogueCatalog>, seed: u64) -> Self {
        Self::with_rng(catalog, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(catalog: Arc<DialogueCatalog>, rng: StdRng) -> Self {
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    pub fn catalog(&self) -> &Arc<DialogueCatalog> {
        &self.catalog
    }

    /// Classify an utterance. Total: every input yields exactly one result.
    pub fn classify(&self, text: &str) -> Classification {
        let utterance = Utterance::new(text);
        let catalog = &self.catalog;

        let classification = if utterance.contains_any(&catalog.greetings.keywords) {
            Classification::Greeting {
                message: self.pick_greeting(),
                follow_up: catalog.greetings.follow_up.clone(),
            }
        } else if let Some(row) = catalog
            .casual
            .iter()
            .find(|row| utterance.contains_any(&row.keywords))
        {
            Classification::Casual {
                reply: row.reply.clone(),
            }
        } else if utterance.contains_any(&catalog.complaint_keywords) {
            Classification::Complaint
        } else if let Some(service) = catalog
            .services
            .iter()
            .find(|s| utterance.contains_any(&s.definitive_keywords))
        {
            Classification::Definitive {
                service: service.clone(),
            }
        } else if let Some(service) = catalog.services.iter().find(|s| {
            utterance.count_matches(&s.supportive_keywords) >= s.min_keyword_matches.max(1)
        }) {
            Classification::Suggestion {
                suggested: service.clone(),
                options: self.suggestion_options(service),
            }
        } else if utterance.word_count() < catalog.low_information_word_count {
            Classification::Clarification {
                show_options: false,
                prompt: catalog.messages.low_information_prompt.clone(),
                options: Vec::new(),
            }
        } else {
            Classification::Clarification {
                show_options: true,
                prompt: catalog.messages.clarification_prompt.clone(),
                options: catalog.all_options(),
            }
        };

        tracing::debug!(
            intent = %classification.intent(),
            words = utterance.word_count(),
            "Classified utterance"
        );

        classification
    }

    fn pick_greeting(&self) -> String {
        let mut rng = self.rng.lock();
        self.catalog
            .greetings
            .responses
            .choose(&mut *rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Suggested service first, remaining services in order, then the support option
    fn suggestion_options(&self, suggested: &ServiceDefinition) -> Vec<ServiceOption> {
        let mut options = vec![suggested.option()];
        for service in &self.catalog.services {
            if !options.iter().any(|o| o.id == service.id) {
                options.push(service.option());
            }
        }
        options.push(self.catalog.support_option());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::with_seed(Arc::new(DialogueCatalog::builtin()), 42)
    }

    #[test]
    fn test_greeting_wins_over_complaint() {
        let result = classifier().classify("hello, this is broken");
        assert_eq!(result.intent(), IntentKind::Greeting);
    }

    #[test]
    fn test_complaint_wins_over_service() {
        assert_eq!(
            classifier().classify("this demo is broken"),
            Classification::Complaint
        );
    }

    #[test]
    fn test_keyword_needs_word_boundary() {
        let utterance = Utterance::new("This is something");
        assert!(!utterance.contains("hi"));
        assert!(utterance.contains("this is"));
        assert!(!utterance.contains("is this"));
        assert!(Utterance::new("Hi!").contains("hi"));
    }

    #[test]
    fn test_multi_word_and_hyphenated_keywords() {
        let utterance = Utterance::new("Is there an add-on for that? It doesn't work");
        assert!(utterance.contains("add-on"));
        assert!(utterance.contains("doesn't work"));
        assert!(!utterance.contains("on that"));
    }

    #[test]
    fn test_definitive_match() {
        let result = classifier().classify("I'd like to schedule demo please");
        match result {
            Classification::Definitive { service } => {
                assert_eq!(service.id, "demo");
                assert_eq!(
                    service.action_message,
                    DialogueCatalog::builtin().service("demo").unwrap().action_message
                );
            }
            other => panic!("expected definitive, got {:?}", other),
        }
    }

    #[test]
    fn test_suggestion_options_order() {
        let result = classifier().classify("show me your platform");
        match result {
            Classification::Suggestion { suggested, options } => {
                assert_eq!(suggested.id, "demo");
                let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
                assert_eq!(ids, vec!["demo", "modules", "licensing", "support_ticket"]);
            }
            other => panic!("expected suggestion, got {:?}", other),
        }
    }

    #[test]
    fn test_suggestion_moves_later_service_first() {
        let result = classifier().classify("what does the subscription cost");
        match result {
            Classification::Suggestion { suggested, options } => {
                assert_eq!(suggested.id, "licensing");
                let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
                assert_eq!(ids, vec!["licensing", "demo", "modules", "support_ticket"]);
            }
            other => panic!("expected suggestion, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_not_reached() {
        // "modules" needs two supportive matches
        let result = classifier().classify("tell me about a feature");
        assert_eq!(result.intent(), IntentKind::Clarification);

        let result = classifier().classify("which feature integrations do you offer");
        match result {
            Classification::Suggestion { suggested, .. } => assert_eq!(suggested.id, "modules"),
            other => panic!("expected suggestion, got {:?}", other),
        }
    }

    #[test]
    fn test_low_information_branch() {
        assert_eq!(classifier().classify("hi").intent(), IntentKind::Greeting);

        match classifier().classify("ok") {
            Classification::Clarification {
                show_options,
                options,
                ..
            } => {
                assert!(!show_options);
                assert!(options.is_empty());
            }
            other => panic!("expected clarification, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        for text in ["", "   ", "\n\t"] {
            match classifier().classify(text) {
                Classification::Clarification { show_options, .. } => assert!(!show_options),
                other => panic!("expected clarification, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_long_unmatched_utterance_shows_menu() {
        match classifier().classify("I am looking for some information about your company") {
            Classification::Clarification {
                show_options,
                options,
                ..
            } => {
                assert!(show_options);
                assert_eq!(options.len(), 4);
                assert!(options.last().unwrap().is_support_ticket());
            }
            other => panic!("expected clarification, got {:?}", other),
        }
    }

    #[test]
    fn test_casual_reply() {
        match classifier().classify("Thanks a lot") {
            Classification::Casual { reply } => {
                assert_eq!(reply, DialogueCatalog::builtin().casual[1].reply);
            }
            other => panic!("expected casual, got {:?}", other),
        }
    }

    #[test]
    fn test_seeded_greeting_is_deterministic() {
        let catalog = Arc::new(DialogueCatalog::builtin());
        let a = IntentClassifier::with_seed(catalog.clone(), 7);
        let b = IntentClassifier::with_seed(catalog.clone(), 7);
        for _ in 0..5 {
            assert_eq!(a.classify("hello"), b.classify("hello"));
        }

        match a.classify("hey") {
            Classification::Greeting { message, follow_up } => {
                assert!(catalog.greetings.responses.contains(&message));
                assert_eq!(follow_up, catalog.greetings.follow_up);
            }
            other => panic!("expected greeting, got {:?}", other),
        }
    }
}
