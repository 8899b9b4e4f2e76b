//! Conversation types: stages, chat messages and per-session state

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::ServiceOption;
use crate::ticket::{FieldDefinition, TicketPriority};

/// Conversation stages of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    /// Nothing resolved yet
    #[default]
    Initial,
    /// A menu or free-text follow-up was requested
    Clarifying,
    /// Resolved to a single service
    Definitive,
    /// Collecting a support ticket
    SupportTicket,
    /// Ticket submitted
    Completed,
}

/// Static transition map. Same-stage moves are always permitted and not listed.
static STAGE_TRANSITIONS: Lazy<HashMap<ConversationStage, &'static [ConversationStage]>> =
    Lazy::new(|| {
        use ConversationStage::*;
        let mut map = HashMap::new();
        map.insert(Initial, &[Clarifying, Definitive, SupportTicket] as &[_]);
        map.insert(Clarifying, &[Definitive, SupportTicket] as &[_]);
        map.insert(Definitive, &[] as &[_]);
        map.insert(SupportTicket, &[Completed] as &[_]);
        map.insert(Completed, &[] as &[_]);
        map
    });

impl ConversationStage {
    /// Get allowed forward transitions from this stage
    pub fn allowed_transitions(&self) -> &'static [ConversationStage] {
        STAGE_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    /// Check if moving to `target` is allowed
    pub fn can_transition_to(&self, target: ConversationStage) -> bool {
        *self == target || self.allowed_transitions().contains(&target)
    }

    /// Whether typed text still goes through the classifier in this stage
    ///
    /// Once a conversation has been resolved (service, ticket form, or
    /// submitted ticket) further free text gets the static follow-up reply.
    pub fn accepts_classification(&self) -> bool {
        matches!(self, ConversationStage::Initial | ConversationStage::Clarifying)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStage::Initial => "initial",
            ConversationStage::Clarifying => "clarifying",
            ConversationStage::Definitive => "definitive",
            ConversationStage::SupportTicket => "support_ticket",
            ConversationStage::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ConversationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// Renderable payload of a chat message
///
/// Each variant carries only the fields valid for that kind of message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    /// Call to action; the host navigates to `redirect_target` on click
    Action {
        text: String,
        button_text: String,
        redirect_target: String,
    },
    ClarificationOptions {
        prompt: String,
        /// Id of the pre-selected suggestion, if the classifier had one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggested: Option<String>,
        options: Vec<ServiceOption>,
    },
    /// Directive to render the ticket form
    SupportForm {
        prompt: String,
        is_complaint: bool,
        priority: TicketPriority,
        fields: Vec<FieldDefinition>,
    },
    Success {
        text: String,
    },
    TicketConfirmation {
        text: String,
        ticket_id: String,
    },
    Error {
        text: String,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        MessageContent::Error { text: text.into() }
    }

    /// Tag name as serialized
    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::Action { .. } => "action",
            MessageContent::ClarificationOptions { .. } => "clarification_options",
            MessageContent::SupportForm { .. } => "support_form",
            MessageContent::Success { .. } => "success",
            MessageContent::TicketConfirmation { .. } => "ticket_confirmation",
            MessageContent::Error { .. } => "error",
        }
    }
}

/// A single entry of the chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Position-derived id, unique within one session
    pub id: u64,
    pub sender: Sender,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(id: u64, sender: Sender, content: MessageContent) -> Self {
        Self {
            id,
            sender,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(id: u64, content: MessageContent) -> Self {
        Self::new(id, Sender::Bot, content)
    }

    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self::new(id, Sender::User, MessageContent::text(text))
    }
}

/// Per-session conversation state, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub stage: ConversationStage,
    /// Distinguishes complaint-triggered (high priority) tickets
    pub is_complaint_ticket: bool,
    /// Append-only message log, used for rendering only
    pub history: Vec<ChatMessage>,
}

impl ConversationState {
    /// Fresh state whose history holds only the welcome message
    pub fn new(welcome: impl Into<String>) -> Self {
        Self {
            stage: ConversationStage::Initial,
            is_complaint_ticket: false,
            history: vec![ChatMessage::bot(0, MessageContent::text(welcome))],
        }
    }

    /// Id the next appended message will receive
    pub fn next_message_id(&self) -> u64 {
        self.history.last().map(|m| m.id + 1).unwrap_or(0)
    }

    /// Append the user's utterance to the history
    pub fn record_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        let id = self.next_message_id();
        self.history.push(ChatMessage::user(id, text));
        &self.history[self.history.len() - 1]
    }

    /// Append bot messages, renumbering them after the current tail
    pub fn append(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        for mut message in messages {
            message.id = self.next_message_id();
            self.history.push(message);
        }
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_transitions() {
        use ConversationStage::*;
        assert!(Initial.can_transition_to(Definitive));
        assert!(Initial.can_transition_to(SupportTicket));
        assert!(Clarifying.can_transition_to(Clarifying));
        assert!(SupportTicket.can_transition_to(Completed));
        assert!(!Definitive.can_transition_to(Clarifying));
        assert!(!Completed.can_transition_to(Initial));
        assert!(!Clarifying.can_transition_to(Initial));
    }

    #[test]
    fn test_accepts_classification() {
        assert!(ConversationStage::Initial.accepts_classification());
        assert!(ConversationStage::Clarifying.accepts_classification());
        assert!(!ConversationStage::Definitive.accepts_classification());
        assert!(!ConversationStage::Completed.accepts_classification());
    }

    #[test]
    fn test_message_content_tagging() {
        let content = MessageContent::Action {
            text: "Pick a slot".into(),
            button_text: "Book".into(),
            redirect_target: "/booking".into(),
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "action");
        assert_eq!(json["redirect_target"], "/booking");
        assert_eq!(content.kind(), "action");
    }

    #[test]
    fn test_state_ids_follow_history() {
        let mut state = ConversationState::new("Welcome!");
        assert_eq!(state.next_message_id(), 1);

        state.record_user("hello");
        state.append(vec![ChatMessage::bot(0, MessageContent::text("Hi there"))]);

        let ids: Vec<u64> = state.history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(state.history[1].sender, Sender::User);
    }
}
