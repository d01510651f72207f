//! Store module
//!
//! Document store over PostgreSQL: connection lifecycle, JSONB document
//! collections and the change subscription consumed by the notifier.

mod change;
mod connection;
mod documents;
mod error;
mod subscription;

pub use change::{ChangeEvent, OperationType, ResumeToken, CHANGE_CHANNEL};
pub use connection::{ConnectionState, PgChangeStream, StoreConnection};
pub use documents::{Collection, Document, DocumentQuery, DocumentStore};
pub use error::StoreError;
pub use subscription::{ChangeSource, ChangeStream};
