use pong_shared::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// No runtime is available to run the power-up timer on.
    #[error("cannot schedule timer: {0}")]
    Scheduler(#[from] tokio::runtime::TryCurrentError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("simulation loop stopped: {0}")]
    LoopClosed(&'static str),
}
