//! Core traits and types for the concierge chat engine
//!
//! This crate provides foundational types used across all other crates:
//! - Service catalog entries and selectable options
//! - Conversation stages, state and the tagged chat message model
//! - Support ticket form, field schema and validation results
//! - Traits for pluggable backends (ticket submission, thinking delay)
//! - Error types

pub mod catalog;
pub mod conversation;
pub mod error;
pub mod ticket;
pub mod traits;

pub use catalog::{ServiceDefinition, ServiceOption, SUPPORT_TICKET_OPTION_ID};
pub use conversation::{ChatMessage, ConversationStage, ConversationState, MessageContent, Sender};
pub use error::{Error, Result};
pub use ticket::{
    FieldDefinition, FieldKind, SupportTicketForm, TicketFieldSchema, TicketPriority,
    TicketReceipt, ValidationResult,
};

// Trait re-exports
pub use traits::{ThinkingDelay, TicketSubmitter};
