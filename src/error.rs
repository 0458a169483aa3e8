use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Upstream Errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    #[error("Envelope rejected: success={success}, code={code}")]
    EnvelopeRejected {
        success: bool,
        code: i64,
    },

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    #[error("Fetch failed after {attempts} attempts: {last_error}")]
    FetchExhausted {
        attempts: u32,
        last_error: Box<Error>,
    },

    // Messaging Errors
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Telegram API error: {description}")]
    TelegramApi {
        description: String,
    },

    #[error("Channel closed")]
    ChannelClosed,

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    // IO Errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Whether the fetch path should try again after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::ConfigError(_)
                | Error::InvalidSchedule(_)
                | Error::TaskFailed(_)
                | Error::FetchExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
