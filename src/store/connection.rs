//! Store Connection
//!
//! Owns the PostgreSQL pool shared by request handlers and the change
//! notifier, with an explicit `open` / `close` lifecycle. The open signal is
//! a `tokio::sync::watch` channel so subscribers can wait for it.

use async_trait::async_trait;
use sqlx::postgres::{PgListener, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::watch;

use crate::config::Config;
use crate::db;

use super::change::{ChangeEvent, CHANGE_CHANNEL};
use super::subscription::{ChangeSource, ChangeStream};
use super::StoreError;

/// Lifecycle state of a [`StoreConnection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Connection manager for the document store
pub struct StoreConnection {
    pool: PgPool,
    state: watch::Sender<ConnectionState>,
}

impl StoreConnection {
    /// Create a connection manager with a lazily connecting pool.
    ///
    /// No network traffic happens until [`open`](Self::open).
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect_lazy(&config.database_url)?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool; the connection starts in `Connecting`
    pub fn from_pool(pool: PgPool) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self { pool, state }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Verify connectivity and schema, then fire the open signal
    pub async fn open(&self) -> Result<(), StoreError> {
        match self.state() {
            ConnectionState::Open => return Ok(()),
            ConnectionState::Closed => return Err(StoreError::ConnectionClosed),
            ConnectionState::Connecting => {}
        }

        db::verify_connection(&self.pool).await?;

        let missing = db::missing_schema_objects(&self.pool).await?;
        if !missing.is_empty() {
            return Err(StoreError::SchemaIncomplete(missing.join(", ")));
        }

        self.state.send_replace(ConnectionState::Open);
        tracing::info!("Store connection is open");
        Ok(())
    }

    /// Resolve once the connection is open
    pub async fn wait_open(&self) -> Result<(), StoreError> {
        let mut state = self.state.subscribe();
        let reached = *state
            .wait_for(|s| *s != ConnectionState::Connecting)
            .await
            .map_err(|_| StoreError::ConnectionClosed)?;

        match reached {
            ConnectionState::Open => Ok(()),
            _ => Err(StoreError::ConnectionClosed),
        }
    }

    /// Subscribe to changes across every collection
    pub async fn watch(&self) -> Result<PgChangeStream, StoreError> {
        match self.state() {
            ConnectionState::Connecting => return Err(StoreError::ConnectionNotReady),
            ConnectionState::Closed => return Err(StoreError::ConnectionClosed),
            ConnectionState::Open => {}
        }

        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        tracing::debug!(channel = CHANGE_CHANNEL, "Listening for document changes");

        Ok(PgChangeStream {
            listener,
            state: self.state.subscribe(),
        })
    }

    /// Mark the connection closed and close the pool.
    ///
    /// Active change streams end, which hands their connections back to the
    /// pool so that closing can complete.
    pub async fn close(&self) {
        self.state.send_replace(ConnectionState::Closed);
        self.pool.close().await;
        tracing::info!("Store connection closed");
    }
}

#[async_trait]
impl ChangeSource for StoreConnection {
    type Stream = PgChangeStream;

    async fn wait_open(&self) -> Result<(), StoreError> {
        StoreConnection::wait_open(self).await
    }

    async fn watch(&self) -> Result<Self::Stream, StoreError> {
        StoreConnection::watch(self).await
    }
}

/// Change stream backed by `LISTEN document_changes`
pub struct PgChangeStream {
    listener: PgListener,
    state: watch::Receiver<ConnectionState>,
}

#[async_trait]
impl ChangeStream for PgChangeStream {
    async fn next_change(&mut self) -> Result<Option<ChangeEvent>, StoreError> {
        loop {
            if *self.state.borrow() == ConnectionState::Closed {
                return Ok(None);
            }

            // close() marks the state before closing the pool, so a pool
            // error seen after that is a normal end of stream.
            tokio::select! {
                biased;

                changed = self.state.changed() => {
                    if changed.is_err() {
                        return Ok(None);
                    }
                }
                notification = self.listener.try_recv() => {
                    let notification = match notification {
                        Ok(notification) => notification,
                        Err(_) if *self.state.borrow() == ConnectionState::Closed => {
                            return Ok(None);
                        }
                        Err(e) => return Err(e.into()),
                    };
                    // try_recv yields None when the connection was lost. A
                    // later call would silently reconnect and skip whatever
                    // happened in between, so the stream ends here instead.
                    let Some(notification) = notification else {
                        return Err(StoreError::SubscriptionClosed);
                    };

                    match ChangeEvent::from_notification(notification.payload()) {
                        Ok(event) => return Ok(Some(event)),
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping malformed change notification");
                        }
                    }
                }
            }
        }
    }
}
