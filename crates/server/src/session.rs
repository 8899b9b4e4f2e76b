//! Session Management
//!
//! One `Conversation` per chat session, held in memory with a capacity
//! limit and idle expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use concierge_agent::Conversation;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::ServerError;

/// Session state
pub struct Session {
    pub id: String,
    pub conversation: Conversation,
    pub created_at: Instant,
    pub last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            id: conversation.session_id().to_string(),
            conversation,
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(
            max_sessions,
            Duration::from_secs(1800),
            Duration::from_secs(60),
        )
    }

    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Start a background task that periodically drops idle sessions.
    ///
    /// Send `true` on the returned channel to stop it.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a session; `build` receives the new session id
    pub fn create(
        &self,
        build: impl FnOnce(String) -> Conversation,
    ) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                tracing::warn!(max = self.max_sessions, "Session limit reached");
                return Err(ServerError::SessionLimit);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(build(id.clone())));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, "Created session");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drop expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let before = sessions.len();
        sessions.retain(|id, s| {
            let keep = !s.is_expired(timeout);
            if !keep {
                tracing::info!(session_id = %id, "Expired session");
            }
            keep
        });
        before - sessions.len()
    }

    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_agent::{DialogueEngine, NoDelay};
    use concierge_config::DialogueCatalog;
    use concierge_persistence::{SimulatedTicketService, TicketServiceConfig};

    fn build(id: String) -> Conversation {
        let engine = Arc::new(DialogueEngine::new(Arc::new(DialogueCatalog::builtin()), Some(0)));
        let tickets = Arc::new(
            SimulatedTicketService::new(TicketServiceConfig {
                latency: Duration::ZERO,
                ..Default::default()
            })
            .unwrap(),
        );
        Conversation::new(id, engine, tickets, Arc::new(NoDelay))
    }

    #[test]
    fn test_session_creation() {
        let manager = SessionManager::new(10);
        let session = manager.create(build).unwrap();

        assert_eq!(session.conversation.session_id(), session.id);
        assert!(!session.is_expired(Duration::from_secs(60)));
        assert!(manager.get(&session.id).is_some());
    }

    #[test]
    fn test_session_remove() {
        let manager = SessionManager::new(10);
        let session = manager.create(build).unwrap();

        assert!(manager.remove(&session.id));
        assert!(manager.get(&session.id).is_none());
        assert!(!manager.remove(&session.id));
    }

    #[test]
    fn test_capacity_limit() {
        let manager = SessionManager::new(1);
        manager.create(build).unwrap();
        assert!(matches!(manager.create(build), Err(ServerError::SessionLimit)));
    }

    #[test]
    fn test_expired_sessions_free_capacity() {
        let manager =
            SessionManager::with_config(1, Duration::ZERO, Duration::from_secs(60));
        let first = manager.create(build).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let second = manager.create(build).unwrap();
        assert!(manager.get(&first.id).is_none());
        assert!(manager.get(&second.id).is_some());
    }

    #[tokio::test]
    async fn test_cleanup_task_stops() {
        let manager = Arc::new(SessionManager::with_config(
            10,
            Duration::ZERO,
            Duration::from_millis(10),
        ));
        manager.create(build).unwrap();

        let shutdown = manager.start_cleanup_task();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(manager.count(), 0);

        shutdown.send(true).unwrap();
    }
}
