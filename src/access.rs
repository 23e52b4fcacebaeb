// Command Gate - Access Control
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Evaluates (role, command) against the permission table.
// Exact entry -> role "*" -> deny. No prefix matching, no case folding,
// no role inheritance. Unknown role = no entries = deny.

use crate::config::CommandConfig;
use crate::context::CallerId;
use crate::permissions::{PermissionTable, Role, WILDCARD};

/// Final word on whether a caller may run a root command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Permission table allows the role
    Granted,
    /// Caller is on the command's allow list (overrides a role deny)
    AllowListed,
    /// Permission table denies the role
    DeniedByRole,
    /// Caller is on the command's block list (overrides everything)
    BlockListed,
}

impl AccessDecision {
    pub fn allowed(&self) -> bool {
        matches!(self, AccessDecision::Granted | AccessDecision::AllowListed)
    }
}

#[derive(Debug, Clone)]
pub struct AccessControl {
    table: PermissionTable,
}

impl AccessControl {
    pub fn new(table: PermissionTable) -> Self {
        Self { table }
    }

    /// Role-level check. Never errors; resolves to false when nothing matches.
    pub fn has_access(&self, role: Role, command: &str) -> bool {
        let Some(rules) = self.table.rules(role) else {
            return false;
        };
        if let Some(&exact) = rules.get(command) {
            return exact;
        }
        rules.get(WILDCARD).copied().unwrap_or(false)
    }

    /// Role check layered with the command's persisted lists.
    /// Block list wins over allow list, allow list wins over the role table.
    pub fn evaluate(
        &self,
        role: Role,
        command: &str,
        caller: &CallerId,
        config: Option<&CommandConfig>,
    ) -> AccessDecision {
        if let Some(config) = config {
            if config.is_block_listed(caller) {
                return AccessDecision::BlockListed;
            }
            if config.is_allow_listed(caller) {
                return AccessDecision::AllowListed;
            }
        }
        if self.has_access(role, command) {
            AccessDecision::Granted
        } else {
            AccessDecision::DeniedByRole
        }
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new(PermissionTable::default())
    }
}
