//! Change Events
//!
//! Records describing a single mutation in the store, as published on the
//! `document_changes` notification channel.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;

/// Notification channel every document mutation is published on
pub const CHANGE_CHANNEL: &str = "document_changes";

/// Kind of mutation a change event describes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    Insert,
    Update,
    Replace,
    Delete,
    /// Operation kinds this build does not know about, kept verbatim
    Other(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Replace => "replace",
            OperationType::Delete => "delete",
            OperationType::Other(kind) => kind,
        }
    }
}

impl From<String> for OperationType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "insert" => OperationType::Insert,
            "update" => OperationType::Update,
            "replace" => OperationType::Replace,
            "delete" => OperationType::Delete,
            _ => OperationType::Other(kind),
        }
    }
}

impl From<OperationType> for String {
    fn from(op: OperationType) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an event in the store's change sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(i64);

impl ResumeToken {
    pub fn new(sequence: i64) -> Self {
        Self(sequence)
    }

    pub fn sequence(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single mutation emitted by the store.
///
/// Events are read once by the change notifier and discarded; nothing in
/// this crate persists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "sequence")]
    pub resume_token: ResumeToken,
    pub operation: OperationType,
    pub collection: String,
    pub document_id: String,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event stamped with the current time
    pub fn new(
        resume_token: ResumeToken,
        operation: OperationType,
        collection: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            resume_token,
            operation,
            collection: collection.into(),
            document_id: document_id.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Decode the JSON payload of a `document_changes` notification
    pub fn from_notification(payload: &str) -> Result<Self, StoreError> {
        serde_json::from_str(payload).map_err(|e| StoreError::MalformedChange(e.to_string()))
    }
}
