// Command Gate - Dispatch Outcomes
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every dispatch ends in exactly one of these. User-facing outcomes are
// values, never errors. HandlerFailed is the only unexpected one.

use serde::Serialize;
use std::fmt;

/// Result of Command Node execution (below the dispatcher's gates)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecOutcome {
    /// Handler at `path` ran to completion
    Executed { path: Vec<String> },
    /// Node at `path` is disabled in config; nothing below it ran
    Disabled { path: Vec<String> },
    /// Node at `path` exists but has no handler
    NotImplemented { path: Vec<String> },
    /// Handler at `path` returned an error or panicked
    HandlerFailed { path: Vec<String>, error: String },
}

/// End-to-end dispatch result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Not a command, or no root node by that name. Nothing replied.
    Ignored,
    /// disableAllCommands is set
    AllCommandsDisabled,
    /// updateMode is set and the caller is not an admin
    UpdateMode,
    /// Role (or block list) denies the root command
    PermissionDenied { command: String },
    Disabled { path: Vec<String> },
    NotImplemented { path: Vec<String> },
    Executed { path: Vec<String> },
    HandlerFailed { path: Vec<String>, error: String },
}

impl From<ExecOutcome> for DispatchOutcome {
    fn from(outcome: ExecOutcome) -> Self {
        match outcome {
            ExecOutcome::Executed { path } => DispatchOutcome::Executed { path },
            ExecOutcome::Disabled { path } => DispatchOutcome::Disabled { path },
            ExecOutcome::NotImplemented { path } => DispatchOutcome::NotImplemented { path },
            ExecOutcome::HandlerFailed { path, error } => DispatchOutcome::HandlerFailed { path, error },
        }
    }
}

impl DispatchOutcome {
    /// Text sent back to the caller, without the ❌ marker. None = stay silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            DispatchOutcome::Ignored | DispatchOutcome::Executed { .. } => None,
            DispatchOutcome::AllCommandsDisabled => Some("All commands are currently disabled.".to_string()),
            DispatchOutcome::UpdateMode => {
                Some("The bot is being updated. Please try again later.".to_string())
            }
            DispatchOutcome::PermissionDenied { .. } => {
                Some("You do not have permission to use this command.".to_string())
            }
            DispatchOutcome::Disabled { path } => Some(format!("Command '{}' is disabled.", leaf(path))),
            DispatchOutcome::NotImplemented { path } => {
                Some(format!("Command '{}' is not implemented.", leaf(path)))
            }
            DispatchOutcome::HandlerFailed { .. } => {
                Some("An unexpected error occurred. Please try again later.".to_string())
            }
        }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, DispatchOutcome::Executed { .. })
    }
}

fn leaf(path: &[String]) -> &str {
    path.last().map(String::as_str).unwrap_or("")
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Ignored => write!(f, "IGNORED"),
            DispatchOutcome::AllCommandsDisabled => write!(f, "DISABLED | all commands"),
            DispatchOutcome::UpdateMode => write!(f, "DENIED | update mode"),
            DispatchOutcome::PermissionDenied { command } => write!(f, "DENIED | {}", command),
            DispatchOutcome::Disabled { path } => write!(f, "DISABLED | {}", path.join(" ")),
            DispatchOutcome::NotImplemented { path } => write!(f, "NOT IMPLEMENTED | {}", path.join(" ")),
            DispatchOutcome::Executed { path } => write!(f, "EXECUTED | {}", path.join(" ")),
            DispatchOutcome::HandlerFailed { path, error } => {
                write!(f, "FAILED | {} | {}", path.join(" "), error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn messages_name_the_leaf_command() {
        let disabled = DispatchOutcome::Disabled { path: path(&["admin", "save"]) };
        assert_eq!(disabled.user_message().unwrap(), "Command 'save' is disabled.");

        let missing = DispatchOutcome::NotImplemented { path: path(&["admin"]) };
        assert_eq!(missing.user_message().unwrap(), "Command 'admin' is not implemented.");
    }

    #[test]
    fn silent_outcomes() {
        assert!(DispatchOutcome::Ignored.user_message().is_none());
        assert!(DispatchOutcome::Executed { path: path(&["start"]) }.user_message().is_none());
    }

    #[test]
    fn handler_failure_message_hides_detail() {
        let failed = DispatchOutcome::HandlerFailed {
            path: path(&["start"]),
            error: "db connection refused".to_string(),
        };
        let msg = failed.user_message().unwrap();
        assert!(!msg.contains("db connection"));
        assert!(failed.to_string().contains("db connection"));
    }

    #[test]
    fn serializes_with_outcome_tag() {
        let json = serde_json::to_value(DispatchOutcome::PermissionDenied { command: "admin".into() }).unwrap();
        assert_eq!(json["outcome"], "permission_denied");
        assert_eq!(json["command"], "admin");
    }
}
