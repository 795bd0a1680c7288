//! Engine lifecycle state machine.
//!
//! One atomic holds the session state so the control thread and the device
//! error callback can both act on it without locks. All transitions are
//! compare-and-swap, so a misuse (double start, stop during stop) can never
//! corrupt the state; the losing caller just sees `false`.

use std::sync::atomic::{AtomicU8, Ordering};

/// The lifecycle states of the engine.
///
/// `Idle → Starting → Running → Stopping → Idle`, with `Running → Error`
/// on device failure. The only way out of `Error` is an explicit stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// No session. The only state `start` accepts.
    Idle = 0,
    /// `start` is acquiring the device.
    Starting = 1,
    /// The audio callback is registered and live.
    Running = 2,
    /// `stop` is tearing the session down.
    Stopping = 3,
    /// The device failed while running; waiting for `stop`.
    Error = 4,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Idle,
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopping,
            _ => LifecycleState::Error,
        }
    }
}

/// Shared lifecycle handle.
///
/// Cloned (via `Arc`) into the device error callback; everything else goes
/// through the engine.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    /// Creates a lifecycle in `Idle`.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Idle as u8),
        }
    }

    /// The current state.
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True while the session is live.
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Idle → Starting`. Fails from any other state.
    pub fn begin_start(&self) -> bool {
        self.transition(LifecycleState::Idle, LifecycleState::Starting)
    }

    /// `Starting → Running`, once the device confirms registration.
    pub fn confirm_running(&self) -> bool {
        self.transition(LifecycleState::Starting, LifecycleState::Running)
    }

    /// `Starting → Idle`, when device acquisition fails.
    pub fn abort_start(&self) -> bool {
        self.transition(LifecycleState::Starting, LifecycleState::Idle)
    }

    /// Enters `Stopping` from any state that has a session to tear down
    /// (`Running`, `Starting`, or `Error`). Returns `false` from `Idle` or
    /// `Stopping`, where there is nothing to stop.
    pub fn begin_stop(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Stopping)
            || self.transition(LifecycleState::Starting, LifecycleState::Stopping)
            || self.transition(LifecycleState::Error, LifecycleState::Stopping)
    }

    /// `Stopping → Idle` once teardown is complete.
    pub fn finish_stop(&self) {
        self.state
            .store(LifecycleState::Idle as u8, Ordering::Release);
    }

    /// `Running → Error`. Called from the device error callback; never
    /// blocks. Returns `false` if the session was not running (a failure
    /// racing a stop is already being torn down).
    pub fn flag_failure(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Error)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
