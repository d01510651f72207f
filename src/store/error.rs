//! Store Errors
//!
//! Error types for store connection, document and change subscription operations.

/// Errors that can occur in the store layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A subscription was attempted before the connection signalled open
    #[error("Store connection is not open yet")]
    ConnectionNotReady,

    /// The connection was closed before or while the operation ran
    #[error("Store connection is closed")]
    ConnectionClosed,

    /// Required tables or triggers are missing
    #[error("Store schema is incomplete, missing: {0}")]
    SchemaIncomplete(String),

    /// The change subscription terminated (connection loss, server reset)
    #[error("Change subscription closed")]
    SubscriptionClosed,

    /// A change notification payload could not be decoded
    #[error("Malformed change notification: {0}")]
    MalformedChange(String),

    /// A document body is not a JSON object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if this error means the store is not usable (yet or anymore)
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionNotReady
                | StoreError::ConnectionClosed
                | StoreError::SubscriptionClosed
                | StoreError::Database(
                    sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
                )
        )
    }
}
