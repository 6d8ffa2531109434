#![forbid(unsafe_code)]

//! Event bus for the DASH client emulator.

mod bus;
mod event;
mod session;
mod track;

pub use bus::EventBus;
pub use event::Event;
pub use session::SessionEvent;
pub use track::TrackEvent;
