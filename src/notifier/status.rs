//! Notifier status counters shared with the HTTP layer.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

use serde::Serialize;

use crate::store::ChangeEvent;

/// State of the change subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// Waiting for the store to signal open
    WaitingForStore,
    Active,
    /// The subscription ended and will not be re-established
    Closed,
}

impl SubscriptionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SubscriptionState::WaitingForStore,
            1 => SubscriptionState::Active,
            _ => SubscriptionState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SubscriptionState::WaitingForStore => 0,
            SubscriptionState::Active => 1,
            SubscriptionState::Closed => 2,
        }
    }
}

/// Live counters of the change notifier
#[derive(Debug, Default)]
pub struct NotifierStatus {
    state: AtomicU8,
    events_received: AtomicU64,
    calls_started: AtomicU64,
    calls_succeeded: AtomicU64,
    calls_failed: AtomicU64,
    // 0 until the first event; store sequences start at 1
    last_resume_token: AtomicI64,
}

/// Point-in-time copy of [`NotifierStatus`]
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub subscription: SubscriptionState,
    pub events_received: u64,
    pub calls_started: u64,
    pub calls_succeeded: u64,
    pub calls_failed: u64,
    pub calls_in_flight: u64,
    pub last_resume_token: Option<i64>,
}

impl NotifierStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubscriptionState {
        SubscriptionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SubscriptionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn record_received(&self, event: &ChangeEvent) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        self.last_resume_token
            .store(event.resume_token.sequence(), Ordering::Relaxed);
    }

    pub(crate) fn record_started(&self) {
        self.calls_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_succeeded(&self) {
        self.calls_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let calls_started = self.calls_started.load(Ordering::Relaxed);
        let calls_succeeded = self.calls_succeeded.load(Ordering::Relaxed);
        let calls_failed = self.calls_failed.load(Ordering::Relaxed);
        let last = self.last_resume_token.load(Ordering::Relaxed);

        StatusSnapshot {
            subscription: self.state(),
            events_received: self.events_received.load(Ordering::Relaxed),
            calls_started,
            calls_succeeded,
            calls_failed,
            calls_in_flight: calls_started.saturating_sub(calls_succeeded + calls_failed),
            last_resume_token: (last != 0).then_some(last),
        }
    }
}
