//! Screen controllers. Each owns its transient state and one [`FlowCell`]
//! that serialises its operations.

pub mod camera;
pub mod home;
pub mod inventory;
pub mod navigation;
pub mod review;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState<Op> {
    Idle,
    InFlight(Op),
    Failed(String),
    Succeeded,
}

/// Result of a fetch-and-replace operation (home list, inventory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// Another load was in flight.
    Ignored,
    Failed(String),
    /// The screen was left before the answer arrived.
    Discarded,
}

impl<Op> FlowState<Op> {
    pub fn is_busy(&self) -> bool {
        matches!(self, FlowState::InFlight(_))
    }
}

/// Busy guard plus mounted flag for one screen.
pub struct FlowCell<Op> {
    state: Mutex<FlowState<Op>>,
    mounted: AtomicBool,
}

impl<Op: Clone> FlowCell<Op> {
    pub fn new() -> Self {
        FlowCell {
            state: Mutex::new(FlowState::Idle),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn state(&self) -> FlowState<Op> {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_busy()
    }

    /// Enter `op` unless another operation is in flight.
    pub fn try_begin(&self, op: Op) -> bool {
        let mut state = self.lock();
        if state.is_busy() {
            return false;
        }
        *state = FlowState::InFlight(op);
        true
    }

    /// Move an in-flight operation to its next phase.
    pub fn advance(&self, op: Op) {
        let mut state = self.lock();
        if state.is_busy() {
            *state = FlowState::InFlight(op);
        }
    }

    pub fn succeed(&self) {
        *self.lock() = FlowState::Succeeded;
    }

    pub fn fail(&self, message: impl Into<String>) {
        *self.lock() = FlowState::Failed(message.into());
    }

    pub fn reset(&self) {
        *self.lock() = FlowState::Idle;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Results that arrive after this are dropped by the owning screen.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlowState<Op>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<Op: Clone> Default for FlowCell<Op> {
    fn default() -> Self {
        Self::new()
    }
}
