//! Error types for memory-box
//!
//! Not-found is not an error: `get` returns `None` and `delete` returns `false`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The store could not be reached (connect, transport, pool)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected or failed to execute a query
    #[error("Store error: {0}")]
    Store(String),

    /// A required constraint or index could not be created
    #[error("Schema setup failed for `{statement}`: {reason}")]
    SchemaSetup { statement: String, reason: String },

    /// Input rejected before any store call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A stored record could not be converted into a model value
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Settings file or environment could not be used
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                        | rusqlite::ErrorCode::NotADatabase
                ) =>
            {
                Error::StoreUnavailable(err.to_string())
            }
            other => Error::Store(other.to_string()),
        }
    }
}

impl From<neo4rs::Error> for Error {
    fn from(err: neo4rs::Error) -> Self {
        match err {
            neo4rs::Error::IOError { .. } | neo4rs::Error::ConnectionError => {
                Error::StoreUnavailable(err.to_string())
            }
            other => Error::Store(other.to_string()),
        }
    }
}

impl From<neo4rs::DeError> for Error {
    fn from(err: neo4rs::DeError) -> Self {
        Error::Conversion(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
