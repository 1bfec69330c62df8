//! The configure/ack state machine shared by all shell adapters.
//!
//! Maximize, fullscreen and activation changes never mutate window flags
//! directly. The compositor proposes a size/state combination carrying a
//! fresh serial; the flags become authoritative only when the client acks
//! that exact serial. A newer proposal supersedes the pending one
//! (last-writer-wins) and any late ack for the superseded serial is a
//! silent no-op.

use bitflags::bitflags;

bitflags! {
    /// State bits carried by a configure proposal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StateSet: u32 {
        const MAXIMIZED = 1 << 0;
        const FULLSCREEN = 1 << 1;
        const ACTIVATED = 1 << 2;
        const RESIZING = 1 << 3;
    }
}

/// A proposed configuration awaiting client acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingConfigure {
    pub serial: u32,
    pub states: StateSet,
    pub size: (u32, u32),
    /// Output the proposal was computed against (maximize/fullscreen).
    pub output_id: Option<u32>,
}

/// Per-window configure bookkeeping.
///
/// Holds at most one pending proposal; issuing a new one makes every older
/// serial permanently stale.
#[derive(Debug, Default)]
pub struct ConfigureTracker {
    pending: Option<PendingConfigure>,
    last_serial: Option<u32>,
}

impl ConfigureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly issued proposal, superseding any pending one.
    pub fn record(&mut self, configure: PendingConfigure) {
        if let Some(last) = self.last_serial {
            if configure.serial <= last {
                // Serials come from the global monotonic counter; seeing a
                // reused one means a bookkeeping bug upstream.
                tracing::warn!(
                    "configure serial {} not greater than last issued {}",
                    configure.serial,
                    last
                );
            }
        }
        self.last_serial = Some(configure.serial);
        self.pending = Some(configure);
    }

    /// Apply an acknowledgement. Returns the proposal when `serial` matches
    /// the pending one; stale or unknown serials return `None` and leave
    /// current state untouched.
    pub fn ack(&mut self, serial: u32) -> Option<PendingConfigure> {
        match self.pending {
            Some(pending) if pending.serial == serial => self.pending.take(),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingConfigure> {
        self.pending.as_ref()
    }

    pub fn last_serial(&self) -> Option<u32> {
        self.last_serial
    }

    /// Drop the pending proposal (window destroyed).
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configure(serial: u32, states: StateSet, size: (u32, u32)) -> PendingConfigure {
        PendingConfigure {
            serial,
            states,
            size,
            output_id: None,
        }
    }

    #[test]
    fn ack_matches_only_the_pending_serial() {
        let mut tracker = ConfigureTracker::new();
        tracker.record(configure(1, StateSet::MAXIMIZED, (1920, 1080)));

        assert_eq!(tracker.ack(99), None);
        let applied = tracker.ack(1).expect("pending serial must apply");
        assert_eq!(applied.states, StateSet::MAXIMIZED);
        assert_eq!(applied.size, (1920, 1080));

        // Second ack for the same serial is a no-op
        assert_eq!(tracker.ack(1), None);
    }

    #[test]
    fn newer_request_supersedes_pending() {
        // Unmaximize (serial 2) then maximize again (serial 3) before any
        // ack: only serial 3 is pending, a late ack for 2 is ignored.
        let mut tracker = ConfigureTracker::new();
        tracker.record(configure(1, StateSet::MAXIMIZED, (1920, 1080)));
        assert!(tracker.ack(1).is_some());

        tracker.record(configure(2, StateSet::empty(), (640, 480)));
        tracker.record(configure(3, StateSet::MAXIMIZED, (2560, 1440)));

        assert_eq!(tracker.ack(2), None);
        let applied = tracker.ack(3).expect("latest request must apply");
        assert_eq!(applied.states, StateSet::MAXIMIZED);
        assert_eq!(applied.size, (2560, 1440));
    }

    #[test]
    fn issued_serials_are_tracked_monotonically() {
        let mut tracker = ConfigureTracker::new();
        tracker.record(configure(5, StateSet::ACTIVATED, (0, 0)));
        tracker.record(configure(8, StateSet::ACTIVATED, (0, 0)));
        assert_eq!(tracker.last_serial(), Some(8));
        // Acking a serial lower than the most recently issued has no effect
        assert_eq!(tracker.ack(5), None);
    }

    #[test]
    fn clear_drops_pending() {
        let mut tracker = ConfigureTracker::new();
        tracker.record(configure(1, StateSet::FULLSCREEN, (800, 600)));
        tracker.clear();
        assert_eq!(tracker.ack(1), None);
        assert!(tracker.pending().is_none());
    }
}
