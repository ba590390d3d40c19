//! Error types for the detection core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Aircraft id (or slot handle) is not part of the current roster.
    #[error("stale reference to aircraft {id}")]
    StaleReference { id: String },

    #[error("aircraft {id} is already registered")]
    DuplicateAircraft { id: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),
}

impl CoreError {
    pub fn stale(id: impl Into<String>) -> Self {
        CoreError::StaleReference { id: id.into() }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidConfiguration(msg.into())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::ConfigParse(err.to_string())
    }
}
