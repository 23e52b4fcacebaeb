// Command Gate - Permission Table
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// role -> (command name -> allow/deny), with "*" as the per-role default.
// Built-in table compiled in; permissions.json may replace it at startup.
// Read-only after load.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Reserved key for a role's default decision
pub const WILDCARD: &str = "*";

/// Closed set of caller roles. Flat: no role inherits from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    /// Anonymous / unknown callers
    All,
}

impl Role {
    pub const ALL_ROLES: [Role; 3] = [Role::Admin, Role::Member, Role::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::All => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "member" => Some(Role::Member),
            "all" => Some(Role::All),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-role command rules
pub type RoleRules = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable {
    roles: BTreeMap<Role, RoleRules>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::builder()
            .rule(Role::Admin, "start", true)
            .rule(Role::Admin, "help", true)
            .rule(Role::Admin, "admin", true)
            .rule(Role::Admin, WILDCARD, true)
            .rule(Role::Member, "start", true)
            .rule(Role::Member, "help", true)
            .rule(Role::Member, "admin", false)
            .rule(Role::Member, WILDCARD, false)
            .rule(Role::All, WILDCARD, false)
            .build()
    }
}

impl PermissionTable {
    /// Empty table: every lookup resolves to deny
    pub fn empty() -> Self {
        Self { roles: BTreeMap::new() }
    }

    pub fn builder() -> PermissionTableBuilder {
        PermissionTableBuilder { table: Self::empty() }
    }

    /// Load from JSON. Missing file → built-in table. Malformed file → error
    /// (unlike commands.json, there is no safe substitute).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No permission table at {:?}, using built-in table", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| GateError::PermissionsRead {
            path: path.to_path_buf(),
            source,
        })?;
        let table: Self = serde_json::from_str(&content).map_err(|source| GateError::PermissionsParse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Permission table loaded from {:?} ({} roles)", path, table.roles.len());
        Ok(table.with_wildcard_defaults())
    }

    /// Give every role a "*" entry. Inserting deny is lookup-equivalent to
    /// having none, so this never changes a decision.
    pub fn with_wildcard_defaults(mut self) -> Self {
        for role in Role::ALL_ROLES {
            let rules = self.roles.entry(role).or_default();
            if !rules.contains_key(WILDCARD) {
                log::warn!("Role '{}' has no '*' entry, defaulting to deny", role);
                rules.insert(WILDCARD.to_string(), false);
            }
        }
        self
    }

    /// Rules for a role, if the table mentions it at all
    pub fn rules(&self, role: Role) -> Option<&RoleRules> {
        self.roles.get(&role)
    }
}

pub struct PermissionTableBuilder {
    table: PermissionTable,
}

impl PermissionTableBuilder {
    pub fn rule(mut self, role: Role, command: &str, allow: bool) -> Self {
        self.table
            .roles
            .entry(role)
            .or_default()
            .insert(command.to_string(), allow);
        self
    }

    pub fn build(self) -> PermissionTable {
        self.table
    }
}
