use std::path::PathBuf;

use dashemu_abr::AbrError;
use dashemu_net::NetError;
use dashemu_player::PlayerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error(transparent)]
    Abr(#[from] AbrError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type EmulatorResult<T> = Result<T, EmulatorError>;
