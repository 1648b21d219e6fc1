//! Per-session flags owned by the host.
//!
//! These used to be process-wide switches. They now live on an explicit
//! context that the coordinator holds for the lifetime of a host session.

#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Cleared when listing fails, restored by the next successful listing.
    pub feature_enabled: bool,
    /// Set by the host when the suggestion quota is exhausted; any selection
    /// change clears it.
    pub limit_reached: bool,
    /// System-initiated customization to apply (at most once per value).
    pub pending_override: Option<String>,
    sequence: u64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            feature_enabled: true,
            limit_reached: false,
            pending_override: None,
            sequence: 0,
        }
    }

    pub fn with_override(mut self, identifier: Option<String>) -> Self {
        self.pending_override = identifier.filter(|id| !id.is_empty());
        self
    }

    /// Hands out a selection write ticket, strictly greater than both every
    /// earlier ticket of this session and the last committed one.
    pub fn next_ticket(&mut self, committed: u64) -> u64 {
        self.sequence = self.sequence.max(committed) + 1;
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_monotonic() {
        let mut session = SessionContext::new();
        let first = session.next_ticket(0);
        let second = session.next_ticket(0);
        assert!(second > first);
    }

    #[test]
    fn test_tickets_skip_past_committed_sequence() {
        let mut session = SessionContext::new();
        assert_eq!(session.next_ticket(41), 42);
        assert_eq!(session.next_ticket(3), 43);
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let session = SessionContext::new().with_override(Some(String::new()));
        assert!(session.pending_override.is_none());
    }
}
