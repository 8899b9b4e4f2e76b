//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Duration;

use concierge_agent::{Conversation, DialogueEngine, NoDelay, RandomizedDelay};
use concierge_config::{DialogueCatalog, Settings};
use concierge_core::{ThinkingDelay, TicketSubmitter};
use concierge_persistence::{NotificationStore, SimulatedTicketService, TicketServiceConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;

use crate::session::SessionManager;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Settings>>,
    pub engine: Arc<DialogueEngine>,
    pub sessions: Arc<SessionManager>,
    pub tickets: Arc<dyn TicketSubmitter>,
    pub notifications: Arc<NotificationStore>,
    pub delay: Arc<dyn ThinkingDelay>,
    /// Prometheus handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from settings and a loaded catalog
    pub fn new(config: Settings, catalog: DialogueCatalog) -> Result<Self, ServerError> {
        let engine = Arc::new(DialogueEngine::new(
            Arc::new(catalog),
            config.conversation.rng_seed,
        ));

        let notifications = Arc::new(NotificationStore::new());
        let tickets = SimulatedTicketService::new(TicketServiceConfig {
            id_prefix: config.tickets.id_prefix.clone(),
            id_suffix_len: config.tickets.id_suffix_len,
            latency: Duration::from_millis(config.tickets.submit_latency_ms),
            rng_seed: config.tickets.rng_seed,
        })?
        .with_notifications(notifications.clone());

        let delay: Arc<dyn ThinkingDelay> = if config.conversation.thinking_delay_enabled {
            Arc::new(RandomizedDelay::from_millis(
                config.conversation.thinking_delay_min_ms,
                config.conversation.thinking_delay_max_ms,
            ))
        } else {
            Arc::new(NoDelay)
        };

        let sessions = Arc::new(SessionManager::with_config(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_timeout_seconds),
            Duration::from_secs(60),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            engine,
            sessions,
            tickets: Arc::new(tickets),
            notifications,
            delay,
            metrics: None,
        })
    }

    /// Replace the ticket backend
    pub fn with_tickets(mut self, tickets: Arc<dyn TicketSubmitter>) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn with_delay(mut self, delay: Arc<dyn ThinkingDelay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }

    /// Conversation wired to the shared engine and backends
    pub fn new_conversation(&self, session_id: String) -> Conversation {
        Conversation::new(
            session_id,
            self.engine.clone(),
            self.tickets.clone(),
            self.delay.clone(),
        )
    }
}
