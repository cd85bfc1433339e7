//! Writer admission
//!
//! A ticket lock: every writer draws a ticket and waits until the counter
//! being served reaches it, so waiting writers are admitted strictly in
//! arrival order.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Queue {
    /// Ticket handed to the next writer that arrives
    next_ticket: u64,

    /// Ticket currently allowed to write
    now_serving: u64,
}

/// Admits one writer at a time, first come first served
#[derive(Debug, Default)]
pub struct WriterGate {
    queue: Mutex<Queue>,
    turn: Condvar,
}

/// Exclusive writer ownership; released when dropped
#[derive(Debug)]
pub struct WriterSlot<'g> {
    gate: &'g WriterGate,
    ticket: u64,
}

impl WriterGate {
    /// Create an idle gate
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        // Two counters cannot be left half-updated, so poisoning is harmless
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the writer slot
    pub fn acquire(&self) -> WriterSlot<'_> {
        let mut queue = self.lock();
        let ticket = queue.next_ticket;
        queue.next_ticket += 1;

        while queue.now_serving != ticket {
            queue = self.turn.wait(queue).unwrap_or_else(PoisonError::into_inner);
        }

        WriterSlot { gate: self, ticket }
    }

    /// Take the writer slot only if nobody holds it or is waiting for it
    pub fn try_acquire(&self) -> Option<WriterSlot<'_>> {
        let mut queue = self.lock();
        if queue.next_ticket != queue.now_serving {
            return None;
        }

        let ticket = queue.next_ticket;
        queue.next_ticket += 1;
        Some(WriterSlot { gate: self, ticket })
    }

    /// Whether a writer currently holds the slot
    pub fn is_held(&self) -> bool {
        let queue = self.lock();
        queue.next_ticket != queue.now_serving
    }

    /// Number of writers waiting behind the current holder
    pub fn waiting(&self) -> u64 {
        let queue = self.lock();
        (queue.next_ticket - queue.now_serving).saturating_sub(1)
    }

    fn release(&self, ticket: u64) {
        let mut queue = self.lock();
        debug_assert_eq!(queue.now_serving, ticket);
        queue.now_serving += 1;
        self.turn.notify_all();
    }
}

impl Drop for WriterSlot<'_> {
    fn drop(&mut self) {
        self.gate.release(self.ticket);
    }
}
