//! Core traits for the concierge chat engine
//!
//! External collaborators the dialogue engine consumes through narrow
//! interfaces:
//!
//! ```text
//! Tickets:
//!   - TicketSubmitter: validated form → ticket receipt (async, may fail)
//!
//! Pacing:
//!   - ThinkingDelay: simulated conversational cadence before a reply
//! ```

mod delay;
mod tickets;

pub use delay::ThinkingDelay;
pub use tickets::TicketSubmitter;
