// Command Gate - Stdio Host
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Newline-delimited JSON in, newline-delimited JSON out. Stands in for a
// chat transport when driving the gate from a pipe or a test.
//   in:  {"from": "5366412848", "text": "/admin status"}
//   out: {"to": "5366412848", "text": "...", "at": "2026-...Z"}
// Logs go to stderr; stdout carries replies only.

use crate::context::{CallerId, ReplySink};
use crate::dispatch::Dispatcher;
use crate::outcome::DispatchOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub from: CallerId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundReply<'a> {
    pub to: &'a CallerId,
    pub text: &'a str,
    pub at: DateTime<Utc>,
}

/// Writes each reply as one JSON line
pub struct JsonLineSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JsonLineSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ReplySink for JsonLineSink<W> {
    fn reply(&self, to: &CallerId, message: &str) -> anyhow::Result<()> {
        let line = serde_json::to_string(&OutboundReply {
            to,
            text: message,
            at: Utc::now(),
        })?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("reply writer poisoned"))?;
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

/// Counters for one serve session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServeStats {
    pub received: u64,
    pub malformed: u64,
    pub executed: u64,
    /// Refused for this caller: role table or block list
    pub denied: u64,
    /// Switched off for everyone: per-command flag or disableAllCommands
    pub disabled: u64,
    pub update_mode: u64,
    pub not_implemented: u64,
    pub failed: u64,
    pub ignored: u64,
}

impl ServeStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Executed { .. } => self.executed += 1,
            DispatchOutcome::PermissionDenied { .. } => self.denied += 1,
            DispatchOutcome::Disabled { .. } | DispatchOutcome::AllCommandsDisabled => self.disabled += 1,
            DispatchOutcome::UpdateMode => self.update_mode += 1,
            DispatchOutcome::NotImplemented { .. } => self.not_implemented += 1,
            DispatchOutcome::HandlerFailed { .. } => self.failed += 1,
            DispatchOutcome::Ignored => self.ignored += 1,
        }
    }
}

/// Read messages until EOF, dispatching each in arrival order
pub fn serve<R: BufRead>(dispatcher: &Dispatcher, input: R) -> ServeStats {
    let mut stats = ServeStats::default();

    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!("stdin read error: {}", e);
                continue;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.received += 1;

        let msg: InboundMessage = match serde_json::from_str(line) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Malformed inbound message: {}", e);
                stats.malformed += 1;
                continue;
            }
        };

        let outcome = dispatcher.dispatch(&msg.text, &msg.from);
        stats.record(&outcome);
    }

    log::info!(
        "Input closed: {} received, {} executed, {} denied, {} disabled, {} failed",
        stats.received,
        stats.executed,
        stats.denied,
        stats.disabled + stats.update_mode,
        stats.failed
    );
    stats
}
