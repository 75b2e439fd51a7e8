use thiserror::Error;

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The rich query could not be parsed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The query uses a selector feature this backend cannot evaluate.
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    /// A record was rejected before being written.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A stored value is not a JSON document.
    #[error("Corrupt record for key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
