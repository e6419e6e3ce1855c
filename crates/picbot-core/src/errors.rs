/// Core error type.
///
/// Adapter crates map their specific errors into this type so the pipeline
/// can handle failures consistently (fatal config vs. skip-and-retry).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("board error: {0}")]
    Board(String),

    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
