//! Single-flight gate for polls

use std::sync::atomic::{AtomicBool, Ordering};

/// "Request in progress" flag
#[derive(Debug, Default)]
pub struct PollGate {
    in_flight: AtomicBool,
}

/// Held for the duration of one fetch; releases the gate on drop
#[derive(Debug)]
pub struct PollPermit<'a> {
    gate: &'a PollGate,
}

impl PollGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate, or `None` if another poll holds it
    pub fn try_acquire(&self) -> Option<PollPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PollPermit { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for PollPermit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let gate = PollGate::new();
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.is_in_flight());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(!gate.is_in_flight());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let gate = PollGate::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = gate.try_acquire();
            panic!("fetch blew up");
        }));
        assert!(result.is_err());
        assert!(!gate.is_in_flight());
    }
}
