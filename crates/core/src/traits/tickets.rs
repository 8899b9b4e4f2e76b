use async_trait::async_trait;

use crate::ticket::{SupportTicketForm, TicketReceipt};
use crate::Result;

/// Ticket persistence collaborator
///
/// Implementations:
/// - `SimulatedTicketService` - in-memory store with artificial latency
///
/// # Example
///
/// ```ignore
/// let tickets: Arc<dyn TicketSubmitter> = Arc::new(SimulatedTicketService::new(config));
/// let receipt = tickets.submit(&form).await?;
/// println!("Created {}", receipt.ticket_id);
/// ```
#[async_trait]
pub trait TicketSubmitter: Send + Sync + 'static {
    /// Submit an already validated form
    ///
    /// The ticket id format is owned by the implementation; callers needing
    /// global uniqueness must layer it on top.
    async fn submit(&self, form: &SupportTicketForm) -> Result<TicketReceipt>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
