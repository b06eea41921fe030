//! Application error types for startup and persistence failures.

use thiserror::Error;

use crate::config::ConfigError;

/// Application-level errors. Every variant is fatal to startup.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Cannot load driver class '{0}'")]
    DriverNotFound(String),

    #[error("No suitable driver: {driver} does not accept url '{url}'")]
    NoSuitableDriver { driver: String, url: String },

    #[error("Invalid connection url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Connection url '{0}' cannot carry credentials")]
    UrlCredentials(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Dialect {dialect} cannot be used with driver {driver}")]
    DialectMismatch { dialect: String, driver: String },

    #[error("Unknown schema generation mode: {0}")]
    UnknownSchemaMode(String),

    #[error("Schema validation failed: missing table {0}")]
    SchemaValidation(String),
}

pub type AppResult<T> = Result<T, AppError>;
