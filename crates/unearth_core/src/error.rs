use thiserror::Error;

/// Errors produced by source/sink adapters built on top of the core.
///
/// The validators themselves never return an error: a candidate that fails
/// structural validation is rejected with `None`, uniformly for every
/// failure class.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid source: {0}")]
    InvalidSource(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
