use thiserror::Error;

/// Failures raised by configuration and corpus loading.
#[derive(Debug, Error)]
pub enum Error {
    /// A setting is present but unusable, e.g. inverted cache water marks.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required input path does not exist.
    #[error("{0} not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
