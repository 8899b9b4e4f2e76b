//! Centralized defaults
//!
//! Single source for values shared by settings defaults, the built-in
//! catalog and tests.

/// Conversational pacing
pub mod pacing {
    /// Lower bound of the simulated thinking delay (inclusive)
    pub const THINKING_DELAY_MIN_MS: u64 = 600;

    /// Upper bound of the simulated thinking delay (exclusive)
    pub const THINKING_DELAY_MAX_MS: u64 = 1400;

    /// Simulated ticket backend latency
    pub const TICKET_SUBMIT_LATENCY_MS: u64 = 1000;
}

/// Ticket identifiers
pub mod tickets {
    pub const ID_PREFIX: &str = "TCK";

    /// Length of the random base-36 suffix
    pub const ID_SUFFIX_LEN: usize = 9;
}

/// Classifier heuristics
pub mod classifier {
    /// Utterances with fewer whitespace-separated words get a free-text
    /// follow-up question instead of an options menu
    pub const LOW_INFORMATION_WORD_COUNT: usize = 5;
}

/// Server defaults
pub mod server {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_MAX_SESSIONS: usize = 1000;
    pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 1800;
}
