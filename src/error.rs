#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cancelled")]
    Cancelled,

    #[error("no open floor for treasure after {attempts} attempts")]
    TreasurePlacement { attempts: u32 },

    #[error("world generation failed: {0}")]
    Generation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("not connected")]
    NotConnected,

    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    /// Cancellation is the only benign way for the round loop to end.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
