//! HTTP Endpoints
//!
//! REST API for the chat widget.

use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    routing::{delete, get, post},
    Router,
};
use concierge_agent::SubmissionOutcome;
use concierge_core::{ChatMessage, SupportTicketForm};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::metrics::{metrics_handler, track_requests};
use crate::session::Session;
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.get_config();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let request_timeout = Duration::from_secs(config.server.request_timeout_seconds);
    drop(config);

    Router::new()
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id", delete(delete_session))
        // Chat turns
        .route("/api/chat/:id/messages", post(send_message))
        .route("/api/chat/:id/select", post(select_option))
        .route("/api/chat/:id/reset", post(reset_conversation))
        .route("/api/chat/:id/ticket", post(submit_ticket))
        // Catalog and notifications
        .route("/api/catalog", get(get_catalog))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/:id", delete(delete_notification))
        .route("/api/debug", get(debug_summary))
        // Health and metrics
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns a permissive layer (development only)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to {}", DEFAULT_ORIGIN);
        return default_cors_layer();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        return default_cors_layer();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    // Credentialed CORS cannot use a wildcard header list
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
        .allow_credentials(true)
}

fn default_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Look up a session and mark it active
fn active_session(state: &AppState, id: &str) -> Result<std::sync::Arc<Session>, ServerError> {
    let session = state
        .sessions
        .get(id)
        .ok_or_else(|| ServerError::SessionNotFound(id.to_string()))?;
    session.touch();
    Ok(session)
}

fn turn_response(session: &Session, messages: Vec<ChatMessage>) -> Json<serde_json::Value> {
    let state = session.conversation.state();
    Json(serde_json::json!({
        "session_id": session.id,
        "messages": messages,
        "stage": state.stage,
        "is_complaint_ticket": state.is_complaint_ticket,
    }))
}

/// Create a new chat session
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServerError> {
    let session = state
        .sessions
        .create(|id| state.new_conversation(id))?;

    let conversation = session.conversation.state();
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session.id,
            "stage": conversation.stage,
            "history": conversation.history,
        })),
    ))
}

/// Get session info
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;
    let conversation = session.conversation.state();

    Ok(Json(serde_json::json!({
        "session_id": session.id,
        "stage": conversation.stage,
        "is_complaint_ticket": conversation.is_complaint_ticket,
        "is_submitting": session.conversation.is_submitting(),
        "history": conversation.history,
    })))
}

/// Delete session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::SessionNotFound(id))
    }
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

/// Typed user text
async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = active_session(&state, &id)?;
    let messages = session.conversation.handle_message(&request.message).await;
    Ok(turn_response(&session, messages))
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    option_id: String,
}

/// Menu or suggestion button press
async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if request.option_id.trim().is_empty() {
        return Err(ServerError::InvalidRequest("option_id must not be empty".to_string()));
    }

    let session = active_session(&state, &id)?;
    let messages = session.conversation.select_option(&request.option_id);
    Ok(turn_response(&session, messages))
}

/// Start over
async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = active_session(&state, &id)?;
    let conversation = session.conversation.reset();

    Ok(Json(serde_json::json!({
        "session_id": session.id,
        "stage": conversation.stage,
        "is_complaint_ticket": conversation.is_complaint_ticket,
        "history": conversation.history,
    })))
}

/// Validate and submit the support ticket form
///
/// Backend failures are reported in-band (`status: failed`) since the
/// conversation stays open for a retry.
async fn submit_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<SupportTicketForm>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = active_session(&state, &id)?;
    let outcome = session.conversation.submit_ticket(form).await?;
    let stage = session.conversation.stage();

    let body = match outcome {
        SubmissionOutcome::Submitted { receipt, messages } => serde_json::json!({
            "status": "submitted",
            "ticket_id": receipt.ticket_id,
            "messages": messages,
            "stage": stage,
        }),
        SubmissionOutcome::Failed { reason, messages } => {
            tracing::warn!(session_id = %id, reason = %reason, "Ticket submission failed");
            serde_json::json!({
                "status": "failed",
                "messages": messages,
                "stage": stage,
            })
        }
    };

    Ok(Json(body))
}

/// Services and ticket form schema
async fn get_catalog(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = state.engine.catalog();
    Json(serde_json::json!({
        "options": catalog.all_options(),
        "services": catalog.services,
        "ticket_schema": catalog.ticket_schema,
    }))
}

async fn list_notifications(State(state): State<AppState>) -> Json<serde_json::Value> {
    let notifications = state.notifications.read();
    Json(serde_json::json!({
        "count": notifications.len(),
        "notifications": notifications,
    }))
}

async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.notifications.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Debug summary for operators
async fn debug_summary(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = state.engine.catalog();
    let config = state.get_config();

    Json(serde_json::json!({
        "environment": config.environment,
        "catalog": {
            "services": catalog.services.len(),
            "complaint_keywords": catalog.complaint_keywords.len(),
            "greeting_keywords": catalog.greetings.keywords.len(),
            "ticket_fields": catalog.ticket_schema.fields.len(),
        },
        "sessions": {
            "active": state.sessions.count(),
            "max": state.sessions.max_sessions(),
        },
        "tickets": {
            "backend": state.tickets.name(),
        },
        "notifications": state.notifications.len(),
        "thinking_delay_enabled": config.conversation.thinking_delay_enabled,
        "metrics_enabled": state.metrics.is_some(),
    }))
}

/// Liveness check
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
        "services": state.engine.catalog().services.len(),
    }))
}
