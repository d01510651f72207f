//! Shared handler state

use std::sync::Arc;

use crate::notifier::NotifierStatus;
use crate::store::DocumentStore;

/// State shared by every API handler
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentStore,
    pub notifier: Arc<NotifierStatus>,
}

impl AppState {
    pub fn new(documents: DocumentStore, notifier: Arc<NotifierStatus>) -> Self {
        Self { documents, notifier }
    }
}
