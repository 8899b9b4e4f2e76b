//! Conversation Management
//!
//! Per-session driver around `ConversationState`. Applies the thinking
//! delay, routes typed text either through the classifier or to the static
//! follow-up reply, and owns the single-in-flight ticket submission rule.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use concierge_core::{
    ChatMessage, ConversationStage, ConversationState, SupportTicketForm, ThinkingDelay,
    TicketPriority, TicketReceipt, TicketSubmitter,
};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::engine::DialogueEngine;
use crate::intent::IntentKind;
use crate::AgentError;

/// Conversation event
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// Typed text was classified
    Classified { intent: IntentKind },
    /// Typed text arrived after routing and got the follow-up reply
    FollowUp,
    StageChanged {
        from: ConversationStage,
        to: ConversationStage,
    },
    TicketSubmitted {
        ticket_id: String,
        priority: TicketPriority,
    },
    TicketFailed { reason: String },
    Reset,
}

/// Result of a submission that passed validation
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// Stage moved to `Completed`
    Submitted {
        receipt: TicketReceipt,
        messages: Vec<ChatMessage>,
    },
    /// Backend failed; the error message was appended and the stage kept
    Failed {
        reason: String,
        messages: Vec<ChatMessage>,
    },
}

impl SubmissionOutcome {
    pub fn messages(&self) -> &[ChatMessage] {
        match self {
            SubmissionOutcome::Submitted { messages, .. } => messages,
            SubmissionOutcome::Failed { messages, .. } => messages,
        }
    }
}

/// Clears the in-flight flag when the submission finishes, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A single chat session
pub struct Conversation {
    session_id: String,
    engine: Arc<DialogueEngine>,
    tickets: Arc<dyn TicketSubmitter>,
    delay: Arc<dyn ThinkingDelay>,
    state: RwLock<ConversationState>,
    submitting: AtomicBool,
    /// Bumped by `reset`; replies computed against an older value are dropped
    generation: AtomicU64,
    event_tx: broadcast::Sender<ConversationEvent>,
}

impl Conversation {
    pub fn new(
        session_id: impl Into<String>,
        engine: Arc<DialogueEngine>,
        tickets: Arc<dyn TicketSubmitter>,
        delay: Arc<dyn ThinkingDelay>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            session_id: session_id.into(),
            state: RwLock::new(engine.new_state()),
            engine,
            tickets,
            delay,
            submitting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            event_tx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ConversationState {
        self.state.read().clone()
    }

    pub fn stage(&self) -> ConversationStage {
        self.state.read().stage
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.state.read().history.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.event_tx.subscribe()
    }

    /// Handle typed text; returns the bot messages appended
    pub async fn handle_message(&self, text: &str) -> Vec<ChatMessage> {
        let generation = {
            let mut state = self.state.write();
            state.record_user(text);
            self.generation.load(Ordering::Acquire)
        };

        self.delay.pause().await;

        let mut state = self.state.write();
        if self.is_stale(generation) {
            tracing::debug!(session_id = %self.session_id, "Reset while thinking, reply dropped");
            return Vec::new();
        }

        let (next, messages) = if state.stage.accepts_classification() {
            let classification = self.engine.classifier().classify(text);
            let intent = classification.intent();

            tracing::info!(
                session_id = %self.session_id,
                intent = %intent,
                stage = %state.stage,
                "Classified message"
            );
            metrics::counter!("concierge_messages_total", "intent" => intent.as_str()).increment(1);
            let _ = self.event_tx.send(ConversationEvent::Classified { intent });

            self.engine.machine().advance(&state, &classification)
        } else {
            tracing::debug!(
                session_id = %self.session_id,
                stage = %state.stage,
                "Message after routing, sending follow-up"
            );
            metrics::counter!("concierge_messages_total", "intent" => "follow_up").increment(1);
            let _ = self.event_tx.send(ConversationEvent::FollowUp);

            self.engine.machine().follow_up(&state)
        };

        self.apply(&mut state, next, &messages);
        messages
    }

    /// Handle a menu selection; unknown ids produce no messages
    pub fn select_option(&self, option_id: &str) -> Vec<ChatMessage> {
        let mut state = self.state.write();
        let (next, messages) = self.engine.machine().select_option(&state, option_id);
        if messages.is_empty() {
            return messages;
        }

        let label = self
            .engine
            .catalog()
            .all_options()
            .into_iter()
            .find(|o| o.id == option_id)
            .map(|o| o.label)
            .unwrap_or_else(|| option_id.to_string());
        state.record_user(label);

        tracing::info!(
            session_id = %self.session_id,
            option_id,
            "Option selected"
        );

        self.apply(&mut state, next, &messages);
        messages
    }

    /// Return to the initial state; idempotent
    pub fn reset(&self) -> ConversationState {
        let mut state = self.state.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *state = self.engine.machine().reset(&state);

        tracing::info!(session_id = %self.session_id, "Conversation reset");
        let _ = self.event_tx.send(ConversationEvent::Reset);

        state.clone()
    }

    /// Validate and submit the ticket form
    ///
    /// Fails fast with `SubmissionInProgress` while another submission for
    /// this session is outstanding. Backend failures are not errors: they
    /// append the generic retry message and keep the stage. If the
    /// conversation is reset while the backend runs, the outcome carries no
    /// messages and the fresh state is left untouched.
    pub async fn submit_ticket(
        &self,
        mut form: SupportTicketForm,
    ) -> Result<SubmissionOutcome, AgentError> {
        let (stage, is_complaint, generation) = {
            let state = self.state.read();
            (
                state.stage,
                state.is_complaint_ticket,
                self.generation.load(Ordering::Acquire),
            )
        };
        if stage != ConversationStage::SupportTicket {
            return Err(AgentError::NotCollectingTicket(stage));
        }

        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(session_id = %self.session_id, "Ticket submission already in flight");
            return Err(AgentError::SubmissionInProgress);
        }
        let _guard = InFlight(&self.submitting);

        if is_complaint {
            form.priority = TicketPriority::High;
        }
        form.session_id = Some(self.session_id.clone());

        let validation = self.engine.validator().validate(&form);
        if !validation.is_valid {
            metrics::counter!("concierge_ticket_validation_failures_total").increment(1);
            return Err(AgentError::Validation(validation.errors));
        }

        match self.tickets.submit(&form).await {
            Ok(receipt) => {
                tracing::info!(
                    session_id = %self.session_id,
                    ticket_id = %receipt.ticket_id,
                    priority = %form.priority,
                    backend = self.tickets.name(),
                    "Ticket submitted"
                );
                metrics::counter!(
                    "concierge_tickets_submitted_total",
                    "priority" => form.priority.as_str()
                )
                .increment(1);

                let mut state = self.state.write();
                let messages = if self.is_stale(generation) {
                    tracing::info!(
                        session_id = %self.session_id,
                        ticket_id = %receipt.ticket_id,
                        "Reset during submission, confirmation dropped"
                    );
                    Vec::new()
                } else {
                    let (next, messages) = self.engine.machine().ticket_submitted(&state, &receipt);
                    self.apply(&mut state, next, &messages);
                    messages
                };
                drop(state);

                let _ = self.event_tx.send(ConversationEvent::TicketSubmitted {
                    ticket_id: receipt.ticket_id.clone(),
                    priority: form.priority,
                });
                Ok(SubmissionOutcome::Submitted { receipt, messages })
            }
            Err(e) => {
                tracing::error!(
                    session_id = %self.session_id,
                    backend = self.tickets.name(),
                    error = %e,
                    "Ticket submission failed"
                );

                let mut state = self.state.write();
                let messages = if self.is_stale(generation) {
                    Vec::new()
                } else {
                    let (next, messages) = self.engine.machine().ticket_failed(&state);
                    self.apply(&mut state, next, &messages);
                    messages
                };
                drop(state);

                let reason = e.to_string();
                let _ = self.event_tx.send(ConversationEvent::TicketFailed {
                    reason: reason.clone(),
                });
                Ok(SubmissionOutcome::Failed { reason, messages })
            }
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) != generation
    }

    fn apply(&self, state: &mut ConversationState, next: ConversationState, messages: &[ChatMessage]) {
        let from = state.stage;
        state.stage = next.stage;
        state.is_complaint_ticket = next.is_complaint_ticket;
        state.append(messages.iter().cloned());

        if from != next.stage {
            tracing::info!(
                session_id = %self.session_id,
                from = %from,
                to = %next.stage,
                "Stage changed"
            );
            let _ = self.event_tx.send(ConversationEvent::StageChanged {
                from,
                to: next.stage,
            });
        }
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("session_id", &self.session_id)
            .field("stage", &self.stage())
            .field("submitting", &self.is_submitting())
            .finish()
    }
}
