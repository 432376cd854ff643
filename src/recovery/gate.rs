use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counting gate bounding simultaneous recoveries across the process.
///
/// The active count never exceeds `capacity` and never underflows.
#[derive(Clone)]
pub struct ConcurrencyGate {
    active: Arc<AtomicU32>,
    capacity: u32,
}

impl ConcurrencyGate {
    pub fn new(capacity: u32) -> Self {
        Self {
            active: Arc::new(AtomicU32::new(0)),
            capacity,
        }
    }

    /// Takes a slot if one is free. The slot is returned when the permit drops.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < self.capacity).then_some(current + 1)
            })
            .ok()
            .map(|_| GatePermit {
                active: Arc::clone(&self.active),
            })
    }

    pub fn active(&self) -> u32 {
        self.active.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.active())
    }
}

/// RAII slot; released on drop, including on panic unwinding.
pub struct GatePermit {
    active: Arc<AtomicU32>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            });
    }
}
