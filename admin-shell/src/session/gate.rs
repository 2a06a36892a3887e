use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight flag for the expiry reaction.
///
/// [`try_enter`](Self::try_enter) sets the flag synchronously, so a second
/// caller observes it even if the first has not resumed from its next
/// suspension point. Dropping the returned permit is the only way to clear it.
#[derive(Debug, Default)]
pub struct ExpiryGate {
    in_flight: AtomicBool,
}

impl ExpiryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` while another reaction holds it.
    pub fn try_enter(&self) -> Option<ExpiryPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExpiryPermit { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn leave(&self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Held for the duration of one reaction; releases the gate on drop.
#[derive(Debug)]
pub struct ExpiryPermit<'a> {
    gate: &'a ExpiryGate,
}

impl Drop for ExpiryPermit<'_> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_enter_is_refused_until_leave() {
        let gate = ExpiryGate::new();

        let permit = gate.try_enter();
        assert!(permit.is_some());
        assert!(gate.is_in_flight());
        assert!(gate.try_enter().is_none());

        drop(permit);
        assert!(!gate.is_in_flight());
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let gate = ExpiryGate::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = gate.try_enter().unwrap();
            panic!("reaction failed");
        }));

        assert!(result.is_err());
        assert!(!gate.is_in_flight());
    }
}
