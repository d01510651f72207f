//! Change Notifier
//!
//! Bridges store change events to the build hook without blocking request
//! handling. Two background tasks cooperate:
//!
//! - the subscription task waits for the store to open, watches every
//!   collection and pushes each event onto a bounded queue;
//! - the delivery worker pops events in arrival order and triggers the build
//!   hook once per event, with at most `max_in_flight` calls outstanding.
//!
//! Failed calls are logged and counted, never retried. A lost subscription is
//! not re-established; the status reports `Closed` until the process restarts.

mod status;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::store::{ChangeEvent, ChangeSource, ChangeStream};

pub use status::{NotifierStatus, StatusSnapshot, SubscriptionState};
pub use webhook::{BuildHook, HttpBuildHook, WebhookError};

/// Configuration for the change notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Events buffered between the subscription and the delivery worker
    pub queue_capacity: usize,
    /// Build hook calls allowed to be outstanding at once
    pub max_in_flight: usize,
    /// Per-call timeout for the build hook (default: 10 seconds)
    pub webhook_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_in_flight: 4,
            webhook_timeout: Duration::from_secs(10),
        }
    }
}

/// Change notifier, ready to be started against a change source
pub struct ChangeNotifier<H> {
    hook: Arc<H>,
    config: NotifierConfig,
    status: Arc<NotifierStatus>,
}

impl<H: BuildHook + 'static> ChangeNotifier<H> {
    pub fn new(hook: H, config: NotifierConfig) -> Self {
        Self {
            hook: Arc::new(hook),
            config,
            status: Arc::new(NotifierStatus::new()),
        }
    }

    /// Shared status counters, e.g. for the status endpoint
    pub fn status(&self) -> Arc<NotifierStatus> {
        self.status.clone()
    }

    /// Spawn the subscription task and the delivery worker.
    ///
    /// Returns immediately. The subscription is only attempted after the
    /// source signals open.
    pub fn start<S: ChangeSource + 'static>(self, source: Arc<S>) -> NotifierHandle {
        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity.max(1));

        tracing::info!(
            target_url = self.hook.target(),
            queue_capacity = self.config.queue_capacity,
            max_in_flight = self.config.max_in_flight,
            "Starting change notifier"
        );

        let subscription = tokio::spawn(run_subscription(source, queue_tx, self.status.clone()));
        let worker = tokio::spawn(run_delivery(
            queue_rx,
            self.hook,
            self.config.max_in_flight,
            self.status.clone(),
        ));

        NotifierHandle {
            subscription,
            worker,
            status: self.status,
        }
    }
}

/// Handle to a running notifier
pub struct NotifierHandle {
    subscription: JoinHandle<()>,
    worker: JoinHandle<()>,
    status: Arc<NotifierStatus>,
}

impl NotifierHandle {
    pub fn status(&self) -> Arc<NotifierStatus> {
        self.status.clone()
    }

    /// Wait until the subscription has ended and every queued event has been
    /// delivered (or has failed).
    pub async fn join(self) {
        if let Err(e) = self.subscription.await {
            tracing::error!(error = %e, "Change subscription task panicked");
        }
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "Build hook delivery task panicked");
        }
    }
}

async fn run_subscription<S: ChangeSource>(
    source: Arc<S>,
    queue: mpsc::Sender<ChangeEvent>,
    status: Arc<NotifierStatus>,
) {
    if let Err(e) = source.wait_open().await {
        tracing::error!(error = %e, "Store closed before it opened; change notifications are disabled");
        status.set_state(SubscriptionState::Closed);
        return;
    }

    let mut stream = match source.watch().await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to subscribe to store changes");
            status.set_state(SubscriptionState::Closed);
            return;
        }
    };

    status.set_state(SubscriptionState::Active);
    tracing::info!("Watching for store changes");

    loop {
        match stream.next_change().await {
            Ok(Some(event)) => {
                status.record_received(&event);
                tracing::debug!(
                    resume_token = %event.resume_token,
                    operation = %event.operation,
                    collection = %event.collection,
                    document_id = %event.document_id,
                    "Change detected"
                );

                if queue.send(event).await.is_err() {
                    tracing::warn!("Build hook delivery stopped, dropping change subscription");
                    break;
                }
            }
            Ok(None) => {
                tracing::info!("Change subscription ended with the store connection");
                break;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Change subscription lost; build hook will not fire until restart"
                );
                break;
            }
        }
    }

    status.set_state(SubscriptionState::Closed);
}

async fn run_delivery<H: BuildHook + 'static>(
    mut queue: mpsc::Receiver<ChangeEvent>,
    hook: Arc<H>,
    max_in_flight: usize,
    status: Arc<NotifierStatus>,
) {
    let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut in_flight = JoinSet::new();

    while let Some(event) = queue.recv().await {
        // Permits are handed out in FIFO order, so calls start in arrival order.
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        while let Some(result) = in_flight.try_join_next() {
            reap_call(result, &status);
        }

        let hook = hook.clone();
        let status = status.clone();
        in_flight.spawn(async move {
            trigger_build(hook.as_ref(), &event, &status).await;
            drop(permit);
        });
    }

    while let Some(result) = in_flight.join_next().await {
        reap_call(result, &status);
    }

    tracing::debug!("Build hook delivery drained");
}

/// A call task that panicked never recorded its outcome; count it as failed.
fn reap_call(result: Result<(), JoinError>, status: &NotifierStatus) {
    if let Err(e) = result {
        status.record_failed();
        tracing::error!(error = %e, "Build hook call task panicked");
    }
}

async fn trigger_build<H: BuildHook + ?Sized>(hook: &H, event: &ChangeEvent, status: &NotifierStatus) {
    status.record_started();

    tracing::info!(
        resume_token = %event.resume_token,
        operation = %event.operation,
        collection = %event.collection,
        "Triggering build hook"
    );

    match hook.trigger(event).await {
        Ok(code) => {
            status.record_succeeded();
            tracing::info!(status = code, resume_token = %event.resume_token, "Build hook triggered");
        }
        Err(WebhookError::HttpStatus(code)) => {
            status.record_failed();
            tracing::warn!(
                status = code,
                resume_token = %event.resume_token,
                target_url = hook.target(),
                "Build hook rejected the call"
            );
        }
        Err(e) => {
            status.record_failed();
            tracing::error!(
                error = %e,
                timed_out = e.is_timeout(),
                resume_token = %event.resume_token,
                target_url = hook.target(),
                "Build hook call failed"
            );
        }
    }
}
