use thiserror::Error;

use crate::table::TableName;

/// Errors produced by a [`Database`][crate::db::Database] backend while executing a single
/// statement.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DbError {
    #[error(transparent)]
    MySql(#[from] mysql::Error),
    #[error("invalid connection url: {0}")]
    MySqlUrl(#[from] mysql::UrlError),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// A table name did not pass the identifier allow-list.
    #[error("{0:?} is not a valid table identifier")]
    InvalidIdentifier(String),
    /// A query returned something other than the single value it should have.
    #[error("expected {expected} from {sql:?}")]
    UnexpectedResult { expected: &'static str, sql: String },
}

/// Errors that abort a benchmark run.
///
/// Every variant is fatal: the harness never retries and never reports a partial measurement.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarnessError {
    /// A table could not be created or dropped.
    #[error("schema change on {table} failed")]
    Schema {
        table: String,
        #[source]
        source: DbError,
    },
    /// A table could not be filled.
    #[error("filling {table} failed")]
    Data {
        table: String,
        #[source]
        source: DbError,
    },
    /// A table still held rows when it was about to be filled, meaning the previous reset left
    /// it dirty.
    #[error("{table} is not empty, refusing to fill it")]
    NotEmpty { table: TableName },
    /// Any failure while a strategy was running.
    #[error("strategy {strategy:?} failed")]
    StrategyExecution {
        strategy: String,
        #[source]
        source: DbError,
    },
    /// No connection to the database could be acquired.
    #[error("could not connect to the database")]
    Connection(#[source] DbError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HarnessError {
    pub(crate) fn schema(table: impl ToString, source: DbError) -> Self {
        Self::Schema {
            table: table.to_string(),
            source,
        }
    }

    pub(crate) fn data(table: &TableName, source: DbError) -> Self {
        Self::Data {
            table: table.to_string(),
            source,
        }
    }
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
