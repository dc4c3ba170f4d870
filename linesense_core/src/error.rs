use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineSenseError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("sample source does not support {0} sampling")]
    Unsupported(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("frame has {got} readings but the array has {expected} sensors")]
    FrameShape { expected: usize, got: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing sample source")]
    MissingSource,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
