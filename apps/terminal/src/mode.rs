//! Operating-mode state machine.
//!
//! The [`ModeController`] is the sole writer of the operating mode and the
//! hold flag. Transitions are explicit functions that update state, drive
//! the poll scheduler (pause on entry to INACTIVE, resume plus an immediate
//! poll on exit from it), and broadcast the new state to every sink.
//!
//! Mode is never persisted: every process starts INACTIVE. That is a
//! deliberate safety default.

use thiserror::Error;
use tracing::{info, warn};

use crate::fanout::SharedUpdateHub;
use crate::poll::SchedulerHandle;

/// Operating mode of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    /// No polling, no trading intent.
    #[default]
    Inactive,
    /// Polling active, trades would be simulated.
    Simulation,
    /// Polling active, trades would be real.
    Live,
}

impl OperatingMode {
    /// The next mode in the INACTIVE → SIMULATION → LIVE cycle.
    #[must_use]
    pub const fn cycled(self) -> Self {
        match self {
            Self::Inactive => Self::Simulation,
            Self::Simulation => Self::Live,
            Self::Live => Self::Inactive,
        }
    }

    /// Whether this mode keeps the poll scheduler paused.
    #[must_use]
    pub const fn is_inactive(self) -> bool {
        matches!(self, Self::Inactive)
    }

    /// Short mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Simulation => "SIMULATION",
            Self::Live => "LIVE",
        }
    }

    /// Header label for this mode combined with the hold flag.
    #[must_use]
    pub const fn display_label(self, holding: bool) -> &'static str {
        match (self, holding) {
            (Self::Inactive, _) => "INACTIVE",
            (Self::Simulation, false) => "SIMULATION",
            (Self::Simulation, true) => "SIMULATION HOLD",
            (Self::Live, false) => "LIVE TRADING",
            (Self::Live, true) => "TRADING HOLD",
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected mode-state operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeError {
    /// Hold was toggled while the mode is INACTIVE.
    #[error("cannot hold while mode is INACTIVE")]
    HoldWhileInactive,
}

/// Owner of the operating mode and hold flag.
///
/// Lives on the operator-input task; no other task mutates mode state.
pub struct ModeController {
    mode: OperatingMode,
    holding: bool,
    hub: SharedUpdateHub,
    scheduler: SchedulerHandle,
}

impl ModeController {
    /// Create a controller starting in INACTIVE with hold cleared.
    #[must_use]
    pub fn new(hub: SharedUpdateHub, scheduler: SchedulerHandle) -> Self {
        Self {
            mode: OperatingMode::Inactive,
            holding: false,
            hub,
            scheduler,
        }
    }

    /// Current operating mode.
    #[must_use]
    pub const fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Current hold flag.
    #[must_use]
    pub const fn holding(&self) -> bool {
        self.holding
    }

    /// Advance the mode cycle and reset the hold flag.
    ///
    /// Pauses the scheduler when entering INACTIVE; resumes it (which also
    /// performs one immediate out-of-band poll) when leaving INACTIVE.
    pub fn cycle_mode(&mut self) -> OperatingMode {
        let previous = self.mode;
        self.mode = self.mode.cycled();
        self.holding = false;

        match (previous.is_inactive(), self.mode.is_inactive()) {
            (false, true) => self.scheduler.pause(),
            (true, false) => self.scheduler.resume(),
            _ => {}
        }

        info!(from = %previous, to = %self.mode, "operating mode changed");
        self.broadcast();
        self.mode
    }

    /// Flip the hold flag.
    ///
    /// Hold does not affect polling; it is an advisory trading-intent pause.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::HoldWhileInactive`] when the mode is INACTIVE;
    /// the flag is left untouched.
    pub fn toggle_hold(&mut self) -> Result<bool, ModeError> {
        if self.mode.is_inactive() {
            warn!("hold rejected: mode is INACTIVE");
            return Err(ModeError::HoldWhileInactive);
        }

        self.holding = !self.holding;
        info!(holding = self.holding, mode = %self.mode, "hold toggled");
        self.broadcast();
        Ok(self.holding)
    }

    /// Request an immediate out-of-cycle poll.
    ///
    /// A no-op while the scheduler is paused (INACTIVE mode).
    pub fn manual_refresh(&self) {
        self.scheduler.refresh();
    }

    fn broadcast(&self) {
        let _ = self.hub.send_mode(self.mode, self.holding);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::fanout::UpdateHub;
    use crate::poll::SchedulerHandle;

    use super::*;

    fn controller() -> (ModeController, SharedUpdateHub) {
        let hub = Arc::new(UpdateHub::with_defaults());
        let handle = SchedulerHandle::detached();
        (ModeController::new(Arc::clone(&hub), handle), hub)
    }

    #[test]
    fn mode_cycles_in_fixed_order() {
        assert_eq!(OperatingMode::Inactive.cycled(), OperatingMode::Simulation);
        assert_eq!(OperatingMode::Simulation.cycled(), OperatingMode::Live);
        assert_eq!(OperatingMode::Live.cycled(), OperatingMode::Inactive);
    }

    #[tokio::test]
    async fn cycle_mode_walks_the_full_circle() {
        let (mut ctl, _hub) = controller();
        assert_eq!(ctl.mode(), OperatingMode::Inactive);

        assert_eq!(ctl.cycle_mode(), OperatingMode::Simulation);
        assert_eq!(ctl.cycle_mode(), OperatingMode::Live);
        assert_eq!(ctl.cycle_mode(), OperatingMode::Inactive);
        assert_eq!(ctl.cycle_mode(), OperatingMode::Simulation);
    }

    #[tokio::test]
    async fn cycle_mode_always_clears_hold() {
        let (mut ctl, _hub) = controller();
        ctl.cycle_mode();
        ctl.toggle_hold().unwrap();
        assert!(ctl.holding());

        ctl.cycle_mode();
        assert!(!ctl.holding());
    }

    #[tokio::test]
    async fn toggle_hold_rejected_while_inactive() {
        let (mut ctl, _hub) = controller();
        let err = ctl.toggle_hold().unwrap_err();
        assert_eq!(err, ModeError::HoldWhileInactive);
        assert!(!ctl.holding());
    }

    #[tokio::test]
    async fn toggle_hold_flips_when_armed() {
        let (mut ctl, _hub) = controller();
        ctl.cycle_mode();
        assert_eq!(ctl.toggle_hold(), Ok(true));
        assert_eq!(ctl.toggle_hold(), Ok(false));
    }

    #[tokio::test]
    async fn transitions_are_broadcast_in_order() {
        let (mut ctl, hub) = controller();
        let mut rx = hub.mode_rx();

        ctl.cycle_mode();
        ctl.toggle_hold().unwrap();
        ctl.cycle_mode();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.mode, OperatingMode::Simulation);
        assert!(!first.holding);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.mode, OperatingMode::Simulation);
        assert!(second.holding);

        let third = rx.recv().await.unwrap();
        assert_eq!(third.mode, OperatingMode::Live);
        assert!(!third.holding);
    }

    #[test]
    fn display_labels_match_header_contract() {
        assert_eq!(OperatingMode::Inactive.display_label(false), "INACTIVE");
        assert_eq!(OperatingMode::Simulation.display_label(true), "SIMULATION HOLD");
        assert_eq!(OperatingMode::Live.display_label(false), "LIVE TRADING");
        assert_eq!(OperatingMode::Live.display_label(true), "TRADING HOLD");
    }
}
