use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("spi error: {0}")]
    Spi(String),
    #[error("channel {0} is not wired on this source")]
    ChannelOutOfRange(u8),
    #[error("{0} sampling is not supported by this source")]
    Unsupported(&'static str),
    #[error("sensor read timeout")]
    Timeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
