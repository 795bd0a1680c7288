//! Parameter snapshot handoff between control and audio threads.
//!
//! The control thread publishes whole `ParameterState` snapshots; the audio
//! thread polls once per callback. The handoff is a single atomically
//! swapped slot, so intermediate snapshots published between two polls are
//! overwritten; only the newest is ever observed. Neither side blocks the
//! other.
//!
//! Memory discipline: the audio thread must never free a snapshot (a free
//! is a syscall away from a glitch), so retired snapshots ride an SPSC
//! reclaim ring back to the control thread, which drops them on its next
//! publish or when the channel is torn down.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::state::ParameterState;

/// Capacity of the reclaim ring. More retired snapshots than this between
/// two control-thread calls forces an in-place drop on the audio thread;
/// each drain resets the budget.
pub const RECLAIM_CAPACITY: usize = 64;

/// Creates a connected publisher/receiver pair.
pub fn state_channel() -> (StatePublisher, StateReceiver) {
    let slot = Arc::new(ArcSwapOption::<ParameterState>::empty());
    let (reclaim_tx, reclaim_rx) = RingBuffer::new(RECLAIM_CAPACITY);

    (
        StatePublisher {
            slot: Arc::clone(&slot),
            reclaim_rx,
        },
        StateReceiver {
            slot,
            reclaim_tx,
            adopted: None,
        },
    )
}

/// Control-thread side: publishes snapshots.
pub struct StatePublisher {
    slot: Arc<ArcSwapOption<ParameterState>>,
    reclaim_rx: Consumer<Arc<ParameterState>>,
}

impl StatePublisher {
    /// Publishes a snapshot, replacing any not-yet-adopted predecessor.
    ///
    /// Never blocks. A predecessor still sitting in the slot is dropped
    /// here, on the control thread.
    pub fn publish(&mut self, state: Arc<ParameterState>) {
        self.collect_retired();
        self.slot.store(Some(state));
    }

    /// Drops snapshots the audio thread has retired. Called on every
    /// publish and at session teardown.
    pub fn collect_retired(&mut self) {
        while self.reclaim_rx.pop().is_ok() {}
    }
}

/// Audio-thread side: polls for and holds the adopted snapshot.
pub struct StateReceiver {
    slot: Arc<ArcSwapOption<ParameterState>>,
    reclaim_tx: Producer<Arc<ParameterState>>,
    adopted: Option<Arc<ParameterState>>,
}

impl StateReceiver {
    /// Polls for a newer snapshot. Call once per callback.
    ///
    /// Returns the freshly adopted snapshot if one was published since the
    /// last poll, or `None` if nothing changed. Wait-free: one swap, one
    /// ring push at most.
    pub fn poll(&mut self) -> Option<&ParameterState> {
        let fresh = self.slot.swap(None)?;

        if let Some(retired) = self.adopted.replace(fresh) {
            if let Err(rtrb::PushError::Full(retired)) = self.reclaim_tx.push(retired) {
                // Ring full: drop in place rather than stall. Bounded by
                // RECLAIM_CAPACITY per control-thread drain interval.
                drop(retired);
            }
        }
        self.adopted.as_deref()
    }

    /// The currently adopted snapshot, if any.
    pub fn current(&self) -> Option<&ParameterState> {
        self.adopted.as_deref()
    }
}
