//! Rule-based dialogue engine
//!
//! Features:
//! - Ordered keyword intent classification
//! - Stage machine over `ConversationState`
//! - Schema-driven ticket validation
//! - Per-session conversation driver with pluggable thinking delay

pub mod conversation;
pub mod delay;
pub mod engine;
pub mod intent;
pub mod stage;
pub mod tickets;

pub use conversation::{Conversation, ConversationEvent, SubmissionOutcome};
pub use delay::{NoDelay, RandomizedDelay};
pub use engine::DialogueEngine;
pub use intent::{Classification, IntentClassifier, IntentKind};
pub use stage::StageMachine;
pub use tickets::{is_valid_email, TicketValidator};

use concierge_core::ConversationStage;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Form failed validation; every violation is listed
    #[error("Ticket validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("A ticket submission is already in progress")]
    SubmissionInProgress,

    #[error("Not collecting a ticket in stage {0}")]
    NotCollectingTicket(ConversationStage),
}
