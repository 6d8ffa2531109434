use crate::{SessionEvent, TrackEvent};

/// Hierarchical: each subsystem has its own variant with a sub-enum.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Track(TrackEvent),
    Session(SessionEvent),
}

impl From<TrackEvent> for Event {
    fn from(e: TrackEvent) -> Self {
        Self::Track(e)
    }
}

impl From<SessionEvent> for Event {
    fn from(e: SessionEvent) -> Self {
        Self::Session(e)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TrackEvent::PlayoutReady { track: 1, segment: 4 })]
    #[case(TrackEvent::Stall { track: 0, segment: 9, stall_ms: 120 })]
    fn track_event_into_event(#[case] track_event: TrackEvent) {
        let event: Event = track_event.clone().into();
        assert_eq!(event, Event::Track(track_event));
    }

    #[test]
    fn session_event_into_event() {
        let event: Event = SessionEvent::Started { tracks: 2 }.into();
        assert!(matches!(event, Event::Session(SessionEvent::Started { tracks: 2 })));
    }
}
