//! In-memory persistence for the concierge chat engine
//!
//! Provides:
//! - Tickets (simulated backend, records kept in memory)
//! - Notifications (injectable store, read/append/remove)

pub mod error;
pub mod notifications;
pub mod tickets;

pub use error::PersistenceError;
pub use notifications::{Notification, NotificationKind, NotificationStore};
pub use tickets::{
    generate_ticket_id, SimulatedTicketService, TicketRecord, TicketServiceConfig, TicketStatus,
};
