//! Compound-word merge detection.
//!
//! Watches the stream of word selections; two distinct keys tapped within
//! the merge window become a proposal to fuse them into one compound
//! vocabulary entry. The proposal suppresses the second word's own status
//! cycle and mutates nothing until the user confirms.

use crate::types::MergeProposal;

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Normal selection: proceed with the status cycle.
    Single,
    /// Offer to fuse the previous selection with this one.
    Proposal(MergeProposal),
}

#[derive(Debug, Clone)]
pub struct MergeDetector {
    window_ms: i64,
    last: Option<(String, i64)>,
}

impl MergeDetector {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms as i64,
            last: None,
        }
    }

    /// Feed one selection. `at_ms` is the injected event timestamp.
    pub fn observe(&mut self, key: &str, at_ms: i64) -> MergeOutcome {
        match self.last.take() {
            Some((first, first_at))
                if first != key && at_ms - first_at <= self.window_ms =>
            {
                // Proposal consumes both selections; the next tap starts
                // a fresh window.
                MergeOutcome::Proposal(MergeProposal {
                    first,
                    second: key.to_string(),
                })
            }
            _ => {
                self.last = Some((key.to_string(), at_ms));
                MergeOutcome::Single
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
