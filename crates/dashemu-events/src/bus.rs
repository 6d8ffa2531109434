use tokio::sync::broadcast;

use crate::Event;

/// Broadcast channel shared by every track of a session.
///
/// `publish()` is a sync call. If there are no subscribers, events are
/// silently dropped; slow subscribers see `RecvError::Lagged(n)` instead of
/// slowing the playback loop.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Accepts sub-enum values directly: `bus.publish(TrackEvent::EndOfTrack { .. })`.
    pub fn publish<E: Into<Event>>(&self, event: E) {
        let _ = self.tx.send(event.into());
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
