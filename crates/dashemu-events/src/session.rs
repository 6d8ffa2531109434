/// Whole-session lifecycle events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Started { tracks: usize },
    /// Every track ended; `segments` counts log entries across tracks.
    Finished { segments: usize },
}
