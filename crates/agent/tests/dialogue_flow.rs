//! End-to-end dialogue tests
//!
//! Drive `Conversation` with the built-in catalog and the simulated ticket
//! backend, no thinking delay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use concierge_agent::{
    AgentError, Classification, Conversation, DialogueEngine, IntentKind, NoDelay,
    RandomizedDelay, SubmissionOutcome,
};
use concierge_config::DialogueCatalog;
use concierge_core::{
    ConversationStage, MessageContent, SupportTicketForm, TicketPriority, TicketReceipt,
    TicketSubmitter,
};
use concierge_persistence::{SimulatedTicketService, TicketServiceConfig};

fn engine() -> Arc<DialogueEngine> {
    Arc::new(DialogueEngine::new(Arc::new(DialogueCatalog::builtin()), Some(9)))
}

fn simulated() -> Arc<SimulatedTicketService> {
    Arc::new(
        SimulatedTicketService::new(TicketServiceConfig {
            latency: Duration::ZERO,
            rng_seed: Some(9),
            ..Default::default()
        })
        .unwrap(),
    )
}

fn conversation_with(tickets: Arc<dyn TicketSubmitter>) -> Conversation {
    Conversation::new("session-1", engine(), tickets, Arc::new(NoDelay))
}

fn valid_form() -> SupportTicketForm {
    SupportTicketForm {
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        topic: "Technical support".to_string(),
        message: "The dashboard will not load".to_string(),
        ..Default::default()
    }
}

/// Backend that always rejects
struct RejectingTickets;

#[async_trait]
impl TicketSubmitter for RejectingTickets {
    async fn submit(&self, _form: &SupportTicketForm) -> concierge_core::Result<TicketReceipt> {
        Err(concierge_core::Error::Unavailable("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "rejecting"
    }
}

/// Backend that blocks until released
struct SlowTickets {
    release: tokio::sync::Notify,
}

#[async_trait]
impl TicketSubmitter for SlowTickets {
    async fn submit(&self, _form: &SupportTicketForm) -> concierge_core::Result<TicketReceipt> {
        self.release.notified().await;
        Ok(TicketReceipt {
            success: true,
            ticket_id: "TCKSLOW00001".to_string(),
        })
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[test]
fn test_classification_priority_examples() {
    let engine = engine();
    let classifier = engine.classifier();

    assert_eq!(
        classifier.classify("hello, this is broken").intent(),
        IntentKind::Greeting
    );
    assert_eq!(
        classifier.classify("this demo is broken").intent(),
        IntentKind::Complaint
    );
    assert_eq!(classifier.classify("hi").intent(), IntentKind::Greeting);

    match classifier.classify("I'd like to schedule demo please") {
        Classification::Definitive { service } => {
            assert_eq!(service.id, "demo");
            assert_eq!(
                service.action_message,
                engine.catalog().service("demo").unwrap().action_message
            );
        }
        other => panic!("expected definitive, got {:?}", other),
    }

    match classifier.classify("show me your platform") {
        Classification::Suggestion { suggested, .. } => {
            assert!(suggested.supportive_keywords.contains(&"platform".to_string()));
            assert_eq!(suggested.min_keyword_matches, 1);
        }
        other => panic!("expected suggestion, got {:?}", other),
    }

    match classifier.classify("ok") {
        Classification::Clarification { show_options, .. } => assert!(!show_options),
        other => panic!("expected clarification, got {:?}", other),
    }
}

#[test]
fn test_classification_serializes_with_intent_tag() {
    let engine = engine();
    let json = serde_json::to_value(engine.classifier().classify("ok")).unwrap();
    assert_eq!(json["intent"], "clarification");
    assert_eq!(json["show_options"], false);
}

#[tokio::test]
async fn test_clarify_then_ticket_flow() {
    let tickets = simulated();
    let conv = conversation_with(tickets.clone());

    conv.handle_message("I am looking for some information about your company")
        .await;
    assert_eq!(conv.stage(), ConversationStage::Clarifying);

    let messages = conv.select_option("support_ticket");
    assert!(matches!(
        messages[1].content,
        MessageContent::SupportForm {
            priority: TicketPriority::Normal,
            ..
        }
    ));
    assert_eq!(conv.stage(), ConversationStage::SupportTicket);

    let outcome = conv.submit_ticket(valid_form()).await.unwrap();
    let receipt = match outcome {
        SubmissionOutcome::Submitted { receipt, messages } => {
            assert_eq!(messages[0].content.kind(), "success");
            assert_eq!(messages[1].content.kind(), "ticket_confirmation");
            receipt
        }
        other => panic!("expected submission, got {:?}", other),
    };

    let pattern = Regex::new(r"^TCK[A-Z0-9]{9}$").unwrap();
    assert!(pattern.is_match(&receipt.ticket_id));
    assert_eq!(conv.stage(), ConversationStage::Completed);

    let record = tickets.get(&receipt.ticket_id).unwrap();
    assert_eq!(record.priority, TicketPriority::Normal);
    assert_eq!(record.session_id.as_deref(), Some("session-1"));
}

#[tokio::test]
async fn test_complaint_ticket_gets_high_priority() {
    let tickets = simulated();
    let conv = conversation_with(tickets.clone());

    conv.handle_message("your checkout is not working").await;
    assert!(conv.state().is_complaint_ticket);

    let outcome = conv.submit_ticket(valid_form()).await.unwrap();
    let SubmissionOutcome::Submitted { receipt, .. } = outcome else {
        panic!("expected submission");
    };
    assert_eq!(
        tickets.get(&receipt.ticket_id).unwrap().priority,
        TicketPriority::High
    );
}

#[tokio::test]
async fn test_validation_errors_keep_stage() {
    let conv = conversation_with(simulated());
    conv.select_option("support_ticket");

    let form = SupportTicketForm {
        topic: "Billing".to_string(),
        ..Default::default()
    };
    match conv.submit_ticket(form).await {
        Err(AgentError::Validation(errors)) => assert_eq!(errors.len(), 3),
        other => panic!("expected validation error, got {:?}", other),
    }

    let form = SupportTicketForm {
        email: "not-an-email".to_string(),
        ..valid_form()
    };
    match conv.submit_ticket(form).await {
        Err(AgentError::Validation(errors)) => {
            assert_eq!(errors, vec!["Please enter a valid email address"])
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    assert_eq!(conv.stage(), ConversationStage::SupportTicket);
    assert!(!conv.is_submitting());
}

#[tokio::test]
async fn test_backend_failure_allows_retry() {
    let conv = conversation_with(Arc::new(RejectingTickets));
    conv.select_option("support_ticket");

    let outcome = conv.submit_ticket(valid_form()).await.unwrap();
    match &outcome {
        SubmissionOutcome::Failed { messages, .. } => {
            assert_eq!(
                messages[0].content,
                MessageContent::error(
                    "We couldn't submit your ticket. Please try again or contact us directly."
                )
            );
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(conv.stage(), ConversationStage::SupportTicket);

    // The stage still accepts a second attempt
    assert!(conv.submit_ticket(valid_form()).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_submission_rejected() {
    let slow = Arc::new(SlowTickets {
        release: tokio::sync::Notify::new(),
    });
    let conv = Arc::new(conversation_with(slow.clone()));
    conv.select_option("support_ticket");

    let first = {
        let conv = conv.clone();
        tokio::spawn(async move { conv.submit_ticket(valid_form()).await })
    };

    while !conv.is_submitting() {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        conv.submit_ticket(valid_form()).await.unwrap_err(),
        AgentError::SubmissionInProgress
    );

    slow.release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Submitted { .. }));
    assert!(!conv.is_submitting());
}

#[tokio::test]
async fn test_reset_from_every_stage() {
    let catalog = DialogueCatalog::builtin();
    let scripts: Vec<Vec<&str>> = vec![
        vec![],
        vec!["ok"],
        vec!["book a demo"],
        vec!["this is broken"],
    ];

    for script in scripts {
        let conv = conversation_with(simulated());
        for line in script {
            conv.handle_message(line).await;
        }

        for _ in 0..2 {
            let state = conv.reset();
            assert_eq!(state.stage, ConversationStage::Initial);
            assert!(!state.is_complaint_ticket);
            assert_eq!(state.history.len(), 1);
            assert_eq!(
                state.history[0].content,
                MessageContent::text(&catalog.messages.welcome)
            );
        }
    }

    // Completed stage
    let conv = conversation_with(simulated());
    conv.select_option("support_ticket");
    conv.submit_ticket(valid_form()).await.unwrap();
    assert_eq!(conv.stage(), ConversationStage::Completed);
    assert_eq!(conv.reset().stage, ConversationStage::Initial);
}

#[tokio::test]
async fn test_reset_during_submission_keeps_fresh_state() {
    let tickets = Arc::new(
        SimulatedTicketService::new(TicketServiceConfig {
            latency: Duration::from_millis(200),
            rng_seed: Some(9),
            ..Default::default()
        })
        .unwrap(),
    );
    let conv = Arc::new(conversation_with(tickets.clone()));
    conv.handle_message("your checkout is not working").await;
    assert_eq!(conv.stage(), ConversationStage::SupportTicket);

    let pending = {
        let conv = conv.clone();
        tokio::spawn(async move { conv.submit_ticket(valid_form()).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    conv.reset();

    let outcome = pending.await.unwrap().unwrap();
    match &outcome {
        SubmissionOutcome::Submitted { receipt, messages } => {
            assert!(messages.is_empty());
            assert!(tickets.get(&receipt.ticket_id).is_some());
        }
        other => panic!("expected submission, got {:?}", other),
    }

    let state = conv.state();
    assert_eq!(state.stage, ConversationStage::Initial);
    assert!(!state.is_complaint_ticket);
    assert_eq!(state.history.len(), 1);
    assert!(!conv.is_submitting());
}

#[tokio::test]
async fn test_reset_while_thinking_drops_reply() {
    let conv = Arc::new(Conversation::new(
        "session-1",
        engine(),
        simulated(),
        Arc::new(RandomizedDelay::from_millis(200, 201)),
    ));

    let pending = {
        let conv = conv.clone();
        tokio::spawn(async move { conv.handle_message("book a demo").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    conv.reset();

    let messages = pending.await.unwrap();
    assert!(messages.is_empty());
    assert_eq!(conv.stage(), ConversationStage::Initial);
    assert_eq!(conv.history().len(), 1);

    // Later turns are unaffected
    let messages = conv.handle_message("ok").await;
    assert_eq!(messages.len(), 1);
}
