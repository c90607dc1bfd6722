//! Resizable admission gate.
//!
//! A counting semaphore whose capacity can move at runtime. Raising the cap
//! releases permits immediately. Lowering it never preempts: permits that
//! are currently held are recorded as debt and retired as they come back.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use ytdlm_core::DownloadError;

#[derive(Debug)]
struct GateState {
    capacity: u32,
    /// Held permits that must be forgotten instead of released.
    debt: u32,
}

#[derive(Debug)]
struct GateInner {
    semaphore: Arc<Semaphore>,
    state: Mutex<GateState>,
}

/// FIFO admission control for running downloads.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    inner: Arc<GateInner>,
}

impl AdmissionGate {
    /// Gate admitting at most `capacity` holders (minimum 1).
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(GateInner {
                semaphore: Arc::new(Semaphore::new(capacity as usize)),
                state: Mutex::new(GateState { capacity, debt: 0 }),
            }),
        }
    }

    /// Wait for a slot. Waiters are served in arrival order.
    ///
    /// Returns `AdmissionCancelled` if `cancel` fires first; no slot is
    /// consumed in that case.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<AdmissionPermit, DownloadError> {
        let semaphore = Arc::clone(&self.inner.semaphore);
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DownloadError::AdmissionCancelled),
            permit = semaphore.acquire_owned() => permit
                .map(|permit| AdmissionPermit {
                    permit: Some(permit),
                    gate: Arc::clone(&self.inner),
                })
                .map_err(|_| DownloadError::AdmissionCancelled),
        }
    }

    /// Change the cap (minimum 1).
    pub fn set_capacity(&self, capacity: u32) {
        let capacity = capacity.max(1);
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);

        if capacity > state.capacity {
            let increase = capacity - state.capacity;
            let repaid = increase.min(state.debt);
            state.debt -= repaid;
            self.inner.semaphore.add_permits((increase - repaid) as usize);
        } else if capacity < state.capacity {
            let decrease = state.capacity - capacity;
            let forgotten = u32::try_from(self.inner.semaphore.forget_permits(decrease as usize))
                .unwrap_or(decrease);
            state.debt += decrease - forgotten;
        }

        state.capacity = capacity;
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity
    }

    /// Slots free right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.semaphore.available_permits()
    }
}

/// A held admission slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    permit: Option<OwnedSemaphorePermit>,
    gate: Arc<GateInner>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        let mut state = self.gate.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.debt > 0 {
            state.debt -= 1;
            permit.forget();
        } else {
            drop(permit);
        }
    }
}
