//! DASH adaptive bitrate client emulator.
//!
//! Facade over the workspace crates. [`Emulator`] turns a JSON
//! [`EmulatorConfig`] into a streaming [`player::Session`] backed by HTTP.
//!
//! ```no_run
//! use dashemu::prelude::*;
//!
//! # async fn demo(manifests: Vec<Manifest>) -> dashemu::EmulatorResult<()> {
//! let config = EmulatorConfig::from_json_str(r#"{"adapt": "bba", "maxBuffer": 30}"#)?;
//! let report = Emulator::new(config)?.run(manifests).await?;
//! println!("{} segments", report.segments());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod config;
mod emulator;
mod error;

pub use config::EmulatorConfig;
pub use emulator::{Emulator, EmulatorFetcher};
pub use error::{EmulatorError, EmulatorResult};

pub mod abr {
    pub use dashemu_abr::*;
}

pub mod events {
    pub use dashemu_events::*;
}

pub mod net {
    pub use dashemu_net::*;
}

pub mod player {
    pub use dashemu_player::*;
}

pub mod prelude {
    pub use dashemu_abr::{Algorithm, Rendition};
    pub use dashemu_events::{Event, SessionEvent, TrackEvent};
    pub use dashemu_player::{
        Manifest, PlayerConfig, SegmentSource, Session, SessionReport, TrackKind, TrackManifest,
    };

    pub use crate::{Emulator, EmulatorConfig, EmulatorError, EmulatorResult};
}
