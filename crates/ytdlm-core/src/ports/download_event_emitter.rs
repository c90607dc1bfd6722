//! Download event emitter port.
//!
//! Lets the orchestrator publish events without knowing who listens
//! (CLI progress bars, tests, a future UI bridge).

use tokio::sync::broadcast;

use crate::download::DownloadEvent;

/// Port for emitting download events.
///
/// Implementations must not block; `emit` is called from the job tasks
/// after the registry lock has been released.
pub trait DownloadEventEmitterPort: Send + Sync {
    /// Emit a download event.
    fn emit(&self, event: DownloadEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort>;
}

/// A no-op download event emitter for tests and headless use.
#[derive(Debug, Clone, Default)]
pub struct NoopDownloadEmitter;

impl NoopDownloadEmitter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventEmitterPort for NoopDownloadEmitter {
    fn emit(&self, _event: DownloadEvent) {}

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Fan-out emitter backed by a `tokio::sync::broadcast` channel.
///
/// Every subscriber receives every event sent after it subscribed. A slow
/// subscriber that falls more than `capacity` events behind sees
/// `RecvError::Lagged` and skips ahead; the orchestrator is never blocked.
#[derive(Debug, Clone)]
pub struct BroadcastDownloadEmitter {
    sender: broadcast::Sender<DownloadEvent>,
}

impl BroadcastDownloadEmitter {
    /// Default number of buffered events per subscriber.
    pub const DEFAULT_CAPACITY: usize = 256;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }

    /// Subscribe to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastDownloadEmitter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DownloadEventEmitterPort for BroadcastDownloadEmitter {
    fn emit(&self, event: DownloadEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::download::{DownloadOptions, Job};

    fn added() -> DownloadEvent {
        DownloadEvent::JobAdded {
            job: Job::new("https://example.com/v", "/tmp", DownloadOptions::default()),
        }
    }

    #[test]
    fn test_noop_emitter() {
        let emitter: Arc<dyn DownloadEventEmitterPort> = Arc::new(NoopDownloadEmitter::new());
        emitter.emit(added());
        let _boxed = emitter.clone_box();
    }

    #[test]
    fn test_broadcast_without_subscribers_does_not_panic() {
        let emitter = BroadcastDownloadEmitter::new(4);
        emitter.emit(added());
        assert_eq!(emitter.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_fans_out_to_all_subscribers() {
        let emitter = BroadcastDownloadEmitter::new(8);
        let mut a = emitter.subscribe();
        let mut b = emitter.subscribe();

        let event = added();
        let id = event.id();
        emitter.clone_box().emit(event);

        assert_eq!(a.recv().await.unwrap().id(), id);
        assert_eq!(b.recv().await.unwrap().id(), id);
    }
}
