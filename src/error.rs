use crate::cluster::ClusterId;
use thiserror::Error;

/// Result alias for `geocluster`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by index construction and cluster lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid option value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The cluster id was not produced by this index.
    #[error("no cluster with id {id}")]
    UnknownCluster {
        /// The id that failed to resolve.
        id: ClusterId,
    },

    /// Options could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
