use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to build connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::BuildError),

    #[error("migration {version} failed: {message}")]
    Migration { version: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid category table: {0}")]
    InvalidCategoryTable(String),

    /// The store could not serve the request at all (missing relation,
    /// unreachable backend).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("cannot decode {table}.{column} as {expected}: {message}")]
    Decode {
        table: &'static str,
        column: &'static str,
        expected: &'static str,
        message: String,
    },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
