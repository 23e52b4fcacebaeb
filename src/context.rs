// Command Gate - Request Context
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Per-message state handed to handlers: who called, with which role,
// the raw text, and the injected reply capability.

use crate::permissions::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque caller identity (numeric chat ids are stored as their decimal string)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for CallerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for CallerId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for CallerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound capability. Provided by the host transport, never implemented here.
pub trait ReplySink: Send + Sync {
    fn reply(&self, to: &CallerId, message: &str) -> anyhow::Result<()>;
}

/// Everything a handler may look at for one inbound message
#[derive(Clone)]
pub struct CommandContext {
    pub caller: CallerId,
    pub role: Role,
    pub text: String,
    pub received_at: DateTime<Utc>,
    sink: Arc<dyn ReplySink>,
}

impl CommandContext {
    pub fn new(caller: CallerId, role: Role, text: &str, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            caller,
            role,
            text: text.to_string(),
            received_at: Utc::now(),
            sink,
        }
    }

    /// Reply to the caller
    pub fn reply(&self, message: &str) -> anyhow::Result<()> {
        self.sink.reply(&self.caller, message)
    }

    /// Best-effort error reply. Delivery failure is logged, never propagated.
    pub fn reply_error(&self, message: &str) {
        if let Err(e) = self.reply(&format!("❌ {}", message)) {
            log::warn!("Failed to deliver error reply to {}: {}", self.caller, e);
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("caller", &self.caller)
            .field("role", &self.role)
            .field("text", &self.text)
            .field("received_at", &self.received_at)
            .finish_non_exhaustive()
    }
}

/// In-memory sink that records every reply. Used by tests and `dispatch` dry runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    replies: std::sync::Mutex<Vec<(CallerId, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of (recipient, message) pairs in delivery order
    pub fn replies(&self) -> Vec<(CallerId, String)> {
        match self.replies.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Just the message texts
    pub fn messages(&self) -> Vec<String> {
        self.replies().into_iter().map(|(_, m)| m).collect()
    }
}

impl ReplySink for RecordingSink {
    fn reply(&self, to: &CallerId, message: &str) -> anyhow::Result<()> {
        let mut guard = self
            .replies
            .lock()
            .map_err(|_| anyhow::anyhow!("reply log poisoned"))?;
        guard.push((to.clone(), message.to_string()));
        Ok(())
    }
}
