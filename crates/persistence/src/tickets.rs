//! Simulated ticket backend
//!
//! Tickets are NOT sent anywhere: the service waits an artificial latency,
//! generates an id and keeps the record in memory for inspection.
//!
//! Ids are `prefix` + random `[A-Z0-9]` suffix with no collision check.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use concierge_core::{
    Result as CoreResult, SupportTicketForm, TicketPriority, TicketReceipt, TicketSubmitter,
};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::notifications::{NotificationKind, NotificationStore};
use crate::PersistenceError;

const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
}

/// Stored ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket_id: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub topic: String,
    pub message: String,
    pub priority: TicketPriority,
    pub session_id: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TicketServiceConfig {
    pub id_prefix: String,
    pub id_suffix_len: usize,
    pub latency: Duration,
    /// Fixed seed for reproducible ids
    pub rng_seed: Option<u64>,
}

impl Default for TicketServiceConfig {
    fn default() -> Self {
        Self {
            id_prefix: "TCK".to_string(),
            id_suffix_len: 9,
            latency: Duration::from_millis(1000),
            rng_seed: None,
        }
    }
}

/// `prefix` followed by `len` characters from `[A-Z0-9]`
pub fn generate_ticket_id<R: Rng + ?Sized>(rng: &mut R, prefix: &str, len: usize) -> String {
    let mut id = String::with_capacity(prefix.len() + len);
    id.push_str(prefix);
    for _ in 0..len {
        let idx = rng.gen_range(0..ID_ALPHABET.len());
        id.push(ID_ALPHABET[idx] as char);
    }
    id
}

pub struct SimulatedTicketService {
    config: TicketServiceConfig,
    rng: Mutex<StdRng>,
    records: RwLock<Vec<TicketRecord>>,
    notifications: Option<Arc<NotificationStore>>,
}

impl SimulatedTicketService {
    pub fn new(config: TicketServiceConfig) -> Result<Self, PersistenceError> {
        if config.id_prefix.is_empty() {
            return Err(PersistenceError::InvalidData(
                "ticket id prefix must not be empty".to_string(),
            ));
        }
        if config.id_suffix_len == 0 {
            return Err(PersistenceError::InvalidData(
                "ticket id suffix length must be at least 1".to_string(),
            ));
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            rng: Mutex::new(rng),
            records: RwLock::new(Vec::new()),
            notifications: None,
        })
    }

    /// Post a notification for every created ticket
    pub fn with_notifications(mut self, store: Arc<NotificationStore>) -> Self {
        self.notifications = Some(store);
        self
    }

    pub fn records(&self) -> Vec<TicketRecord> {
        self.records.read().clone()
    }

    pub fn get(&self, ticket_id: &str) -> Option<TicketRecord> {
        self.records
            .read()
            .iter()
            .find(|r| r.ticket_id == ticket_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn next_id(&self) -> String {
        let mut rng = self.rng.lock();
        generate_ticket_id(&mut *rng, &self.config.id_prefix, self.config.id_suffix_len)
    }
}

#[async_trait]
impl TicketSubmitter for SimulatedTicketService {
    async fn submit(&self, form: &SupportTicketForm) -> CoreResult<TicketReceipt> {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let ticket_id = self.next_id();
        let record = TicketRecord {
            ticket_id: ticket_id.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            company: form.company.clone().filter(|c| !c.trim().is_empty()),
            topic: form.topic.clone(),
            message: form.message.clone(),
            priority: form.priority,
            session_id: form.session_id.clone(),
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };
        self.records.write().push(record);

        if let Some(store) = &self.notifications {
            store.append(
                NotificationKind::TicketCreated,
                format!("New {} priority ticket", form.priority),
                format!("{} from {} ({})", ticket_id, form.name.trim(), form.topic),
            );
        }

        tracing::info!(
            ticket_id = %ticket_id,
            priority = %form.priority,
            session_id = ?form.session_id,
            "Simulated ticket created"
        );

        Ok(TicketReceipt {
            success: true,
            ticket_id,
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
