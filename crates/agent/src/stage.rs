//! Conversation stage machine
//!
//! Pure functions over `ConversationState`. Each operation returns the next
//! state together with the bot messages to append; the returned state does
//! not contain those messages yet, the caller appends them.
//!
//! Stage changes follow `ConversationStage::can_transition_to`. A change
//! that is not allowed from the current stage is logged and skipped.

use std::sync::Arc;

use concierge_config::DialogueCatalog;
use concierge_core::{
    ChatMessage, ConversationStage, ConversationState, MessageContent, ServiceDefinition,
    TicketPriority, TicketReceipt, SUPPORT_TICKET_OPTION_ID,
};

use crate::intent::Classification;

/// Applies classifications and selections to a conversation
#[derive(Debug, Clone)]
pub struct StageMachine {
    catalog: Arc<DialogueCatalog>,
}

impl StageMachine {
    pub fn new(catalog: Arc<DialogueCatalog>) -> Self {
        Self { catalog }
    }

    /// Apply an already computed classification
    pub fn advance(
        &self,
        state: &ConversationState,
        classification: &Classification,
    ) -> (ConversationState, Vec<ChatMessage>) {
        let mut next = state.clone();
        let messages = match classification {
            Classification::Greeting { message, follow_up } => vec![
                MessageContent::text(message),
                MessageContent::text(follow_up),
            ],
            Classification::Casual { reply } => vec![MessageContent::text(reply)],
            Classification::Complaint => {
                if self.move_to(&mut next, ConversationStage::SupportTicket) {
                    next.is_complaint_ticket = true;
                }
                vec![
                    MessageContent::text(&self.catalog.messages.complaint_prompt),
                    self.support_form(true),
                ]
            }
            Classification::Definitive { service } => {
                self.move_to(&mut next, ConversationStage::Definitive);
                self.resolution(service)
            }
            Classification::Suggestion { suggested, options } => {
                self.move_to(&mut next, ConversationStage::Clarifying);
                vec![MessageContent::ClarificationOptions {
                    prompt: self.catalog.messages.suggestion_prompt_for(&suggested.label),
                    suggested: Some(suggested.id.clone()),
                    options: options.clone(),
                }]
            }
            Classification::Clarification {
                show_options,
                prompt,
                options,
            } => {
                self.move_to(&mut next, ConversationStage::Clarifying);
                if *show_options {
                    vec![MessageContent::ClarificationOptions {
                        prompt: prompt.clone(),
                        suggested: None,
                        options: options.clone(),
                    }]
                } else {
                    vec![MessageContent::text(prompt)]
                }
            }
        };

        let messages = bot_messages(state, messages);
        (next, messages)
    }

    /// Apply a menu selection
    ///
    /// Unknown ids, and selections whose stage change is not allowed from
    /// the current stage, leave the state untouched and produce no messages.
    pub fn select_option(
        &self,
        state: &ConversationState,
        option_id: &str,
    ) -> (ConversationState, Vec<ChatMessage>) {
        let (target, contents) = if option_id == SUPPORT_TICKET_OPTION_ID {
            (
                ConversationStage::SupportTicket,
                vec![
                    MessageContent::text(&self.catalog.messages.support_prompt),
                    self.support_form(false),
                ],
            )
        } else if let Some(service) = self.catalog.service(option_id) {
            (ConversationStage::Definitive, self.resolution(service))
        } else {
            tracing::debug!(option_id, "Ignoring unknown option");
            return (state.clone(), Vec::new());
        };

        if !state.stage.can_transition_to(target) {
            tracing::debug!(
                option_id,
                from = %state.stage,
                to = %target,
                "Ignoring selection not allowed from current stage"
            );
            return (state.clone(), Vec::new());
        }

        let mut next = state.clone();
        next.stage = target;
        next.is_complaint_ticket = false;
        let messages = bot_messages(state, contents);
        (next, messages)
    }

    /// Fresh state holding only the welcome message. Idempotent.
    pub fn reset(&self, _state: &ConversationState) -> ConversationState {
        ConversationState::new(&self.catalog.messages.welcome)
    }

    /// Static reply to typed text once the conversation has been routed
    pub fn follow_up(&self, state: &ConversationState) -> (ConversationState, Vec<ChatMessage>) {
        let messages = bot_messages(
            state,
            vec![MessageContent::text(&self.catalog.messages.follow_up_message)],
        );
        (state.clone(), messages)
    }

    /// Successful submission: success and confirmation messages, stage `Completed`
    pub fn ticket_submitted(
        &self,
        state: &ConversationState,
        receipt: &TicketReceipt,
    ) -> (ConversationState, Vec<ChatMessage>) {
        let mut next = state.clone();
        self.move_to(&mut next, ConversationStage::Completed);

        let messages = bot_messages(
            state,
            vec![
                MessageContent::Success {
                    text: self.catalog.messages.ticket_success.clone(),
                },
                MessageContent::TicketConfirmation {
                    text: self
                        .catalog
                        .messages
                        .ticket_confirmation_for(&receipt.ticket_id),
                    ticket_id: receipt.ticket_id.clone(),
                },
            ],
        );
        (next, messages)
    }

    /// Failed submission: generic error message, stage unchanged so the user can retry
    pub fn ticket_failed(&self, state: &ConversationState) -> (ConversationState, Vec<ChatMessage>) {
        let messages = bot_messages(
            state,
            vec![MessageContent::error(&self.catalog.messages.submission_error)],
        );
        (state.clone(), messages)
    }

    fn move_to(&self, state: &mut ConversationState, target: ConversationStage) -> bool {
        if state.stage.can_transition_to(target) {
            if state.stage != target {
                tracing::debug!(from = %state.stage, to = %target, "Stage transition");
            }
            state.stage = target;
            true
        } else {
            tracing::warn!(
                from = %state.stage,
                to = %target,
                "Stage transition not allowed, keeping current stage"
            );
            false
        }
    }

    fn resolution(&self, service: &ServiceDefinition) -> Vec<MessageContent> {
        vec![
            MessageContent::text(&service.confirmation_message),
            MessageContent::Action {
                text: service.action_message.clone(),
                button_text: service.button_text.clone(),
                redirect_target: service.redirect_target.clone(),
            },
        ]
    }

    fn support_form(&self, is_complaint: bool) -> MessageContent {
        MessageContent::SupportForm {
            prompt: self.catalog.messages.form_prompt.clone(),
            is_complaint,
            priority: if is_complaint {
                TicketPriority::High
            } else {
                TicketPriority::Normal
            },
            fields: self.catalog.ticket_schema.fields.clone(),
        }
    }
}

/// Number bot messages after the current history tail
fn bot_messages(state: &ConversationState, contents: Vec<MessageContent>) -> Vec<ChatMessage> {
    let first = state.next_message_id();
    contents
        .into_iter()
        .enumerate()
        .map(|(offset, content)| ChatMessage::bot(first + offset as u64, content))
        .collect()
}
