//! Change subscription seams
//!
//! The change notifier only talks to the store through these traits, so a
//! fake store can stand in for PostgreSQL in tests.

use async_trait::async_trait;

use super::{ChangeEvent, StoreError};

/// A live stream of change events
#[async_trait]
pub trait ChangeStream: Send {
    /// Wait for the next change.
    ///
    /// `Ok(None)` means the stream ended because the store was closed.
    /// An error means the subscription was lost; callers must not poll again.
    async fn next_change(&mut self) -> Result<Option<ChangeEvent>, StoreError>;
}

/// Something that can be watched for changes once it is open
#[async_trait]
pub trait ChangeSource: Send + Sync {
    type Stream: ChangeStream + 'static;

    /// Resolve once the source signals open. Fails if it closes first.
    async fn wait_open(&self) -> Result<(), StoreError>;

    /// Subscribe to every change in the store.
    ///
    /// Fails with [`StoreError::ConnectionNotReady`] before the open signal.
    async fn watch(&self) -> Result<Self::Stream, StoreError>;
}
