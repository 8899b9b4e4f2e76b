//! Shared dialogue engine
//!
//! Bundles the read-only pieces every chat session uses: the catalog, the
//! classifier, the stage machine and the ticket validator. One instance is
//! built at startup and shared by `Arc`.

use std::sync::Arc;

use concierge_config::DialogueCatalog;
use concierge_core::ConversationState;

use crate::intent::IntentClassifier;
use crate::stage::StageMachine;
use crate::tickets::TicketValidator;

pub struct DialogueEngine {
    catalog: Arc<DialogueCatalog>,
    classifier: IntentClassifier,
    machine: StageMachine,
    validator: TicketValidator,
}

impl DialogueEngine {
    /// Build the engine; `rng_seed` fixes greeting selection
    pub fn new(catalog: Arc<DialogueCatalog>, rng_seed: Option<u64>) -> Self {
        let classifier = match rng_seed {
            Some(seed) => IntentClassifier::with_seed(catalog.clone(), seed),
            None => IntentClassifier::new(catalog.clone()),
        };

        Self {
            machine: StageMachine::new(catalog.clone()),
            validator: TicketValidator::new(Arc::new(catalog.ticket_schema.clone())),
            classifier,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Arc<DialogueCatalog> {
        &self.catalog
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn machine(&self) -> &StageMachine {
        &self.machine
    }

    pub fn validator(&self) -> &TicketValidator {
        &self.validator
    }

    /// Initial state for a new session
    pub fn new_state(&self) -> ConversationState {
        ConversationState::new(&self.catalog.messages.welcome)
    }
}

impl std::fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueEngine")
            .field("services", &self.catalog.services.len())
            .finish()
    }
}
