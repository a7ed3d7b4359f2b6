use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    /// Directory or channel unreachable. Callers degrade to an empty or
    /// fallback state; this is never fatal.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("insufficient balance: have {balance}, need {price}")]
    InsufficientBalance { balance: u64, price: u64 },

    /// Send attempted while no channel session is connected. Logged and
    /// dropped by the session layer; surfaced only for introspection.
    #[error("transport dropped: no connected session")]
    TransportDropped,

    #[error("unknown gift id: {0}")]
    UnknownGift(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serde(e.to_string())
    }
}

impl EngineError {
    /// Returns whether re-driving the originating action may succeed
    /// (e.g. re-activating a session after a failed subscribe).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Unavailable(_) | EngineError::TransportDropped
        )
    }
}
