//! Request generations.
//!
//! Every set-content request takes a [`RequestTicket`] before doing any work.
//! Tickets are numbered from a shared monotonically increasing counter; a
//! ticket is current only while no newer ticket has been issued. The content
//! preparer and the playback graph check the ticket before committing, so
//! whichever request started last wins regardless of completion order.
//!
//! A request that turns out to carry nothing playable can
//! [`withdraw`](RequestGenerations::withdraw) its ticket, handing "current"
//! back to the request it displaced. Generation numbers are never reused.

use crate::error::{PlaybackError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counter {
    /// Most recently issued generation.
    issued: u64,
    /// Generation allowed to commit.
    current: u64,
}

/// Issues tickets. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RequestGenerations {
    counter: Arc<Mutex<Counter>>,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, making every earlier ticket stale.
    pub fn begin(&self) -> RequestTicket {
        let mut counter = self.counter.lock();
        counter.issued += 1;
        let issued = counter.issued;
        let preceding = std::mem::replace(&mut counter.current, issued);
        RequestTicket {
            generation: counter.issued,
            preceding,
            counter: Arc::clone(&self.counter),
        }
    }

    /// Give up `ticket` without superseding anyone.
    ///
    /// If `ticket` is still current, the request that was current when it
    /// began becomes current again. Returns `false` when a newer request had
    /// already started, in which case nothing changes.
    pub fn withdraw(&self, ticket: &RequestTicket) -> bool {
        let mut counter = self.counter.lock();
        if counter.current != ticket.generation {
            return false;
        }
        counter.current = ticket.preceding;
        true
    }

    /// Generation of the most recently issued ticket (0 before the first).
    pub fn latest(&self) -> u64 {
        self.counter.lock().issued
    }

    /// Generation allowed to commit (0 when none).
    pub fn current(&self) -> u64 {
        self.counter.lock().current
    }
}

/// Proof that a request was started, and a way to ask whether it still wins.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    preceding: u64,
    counter: Arc<Mutex<Counter>>,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.counter.lock().current == self.generation
    }

    /// `Err(Superseded)` once a newer request has begun.
    pub fn ensure_current(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(PlaybackError::Superseded {
                generation: self.generation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_monotonic() {
        let generations = RequestGenerations::new();
        assert_eq!(generations.latest(), 0);
        let first = generations.begin();
        let second = generations.begin();
        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert_eq!(generations.latest(), 2);
        assert_eq!(generations.current(), 2);
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let generations = RequestGenerations::new();
        let first = generations.begin();
        assert!(first.is_current());

        let second = generations.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(matches!(
            first.ensure_current(),
            Err(PlaybackError::Superseded { generation: 1 })
        ));
        assert!(second.ensure_current().is_ok());
    }

    #[test]
    fn test_clones_share_the_counter() {
        let generations = RequestGenerations::new();
        let ticket = generations.begin();
        let other_handle = generations.clone();
        other_handle.begin();
        assert!(!ticket.is_current());
    }

    #[test]
    fn test_withdraw_restores_displaced_ticket() {
        let generations = RequestGenerations::new();
        let first = generations.begin();
        let empty = generations.begin();
        assert!(!first.is_current());

        assert!(generations.withdraw(&empty));
        assert!(first.is_current());
        assert!(!empty.is_current());
        assert_eq!(generations.current(), 1);

        // Numbers keep counting up.
        let next = generations.begin();
        assert_eq!(next.generation(), 3);
        assert_eq!(generations.latest(), 3);
        assert!(!first.is_current());
    }

    #[test]
    fn test_withdraw_after_newer_request_changes_nothing() {
        let generations = RequestGenerations::new();
        let empty = generations.begin();
        let newer = generations.begin();

        assert!(!generations.withdraw(&empty));
        assert!(newer.is_current());
        assert_eq!(generations.current(), 2);
    }

    #[test]
    fn test_nested_withdrawals_unwind_in_order() {
        let generations = RequestGenerations::new();
        let first = generations.begin();
        let second = generations.begin();
        let third = generations.begin();

        assert!(generations.withdraw(&third));
        assert!(second.is_current());
        assert!(generations.withdraw(&second));
        assert!(first.is_current());
    }
}
