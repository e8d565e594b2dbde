use serde::{Deserialize, Serialize};

/// Monotonic id sequence. Events and seasons each draw from their own
/// sequence so season numbers stay dense (1, 2, 3, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    next: u64,
}

impl Sequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Continue after ids already handed out, e.g. after loading persisted rows.
    /// Never moves the sequence backwards.
    pub fn resume_after(&mut self, last_used: u64) {
        self.next = self.next.max(last_used.saturating_add(1));
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}
