// Command Gate - Role Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// identity -> exactly one Role. Unknown identities fall back to Role::All.
// Resolved once per inbound message, before any command-level check.

use crate::context::CallerId;
use crate::error::{GateError, Result};
use crate::permissions::Role;
use std::collections::HashMap;
use std::path::Path;

/// Injected role source. Hosts backed by a directory/admin list implement this.
pub trait RoleResolver: Send + Sync {
    fn resolve_role(&self, caller: &CallerId) -> Role;
}

/// Static identity → role lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRoleMap {
    roles: HashMap<CallerId, Role>,
}

impl StaticRoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, caller: impl Into<CallerId>, role: Role) -> Self {
        self.insert(caller.into(), role);
        self
    }

    pub fn insert(&mut self, caller: CallerId, role: Role) {
        if let Some(previous) = self.roles.insert(caller.clone(), role) {
            if previous != role {
                log::debug!("Role for {} changed {} -> {}", caller, previous, role);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Load roles.json: `{ "<identity>": "admin" | "member" | "all" }`.
    /// Missing file → empty map.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No role map at {:?}, all callers start as '{}'", path, Role::All);
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|source| GateError::RolesRead {
            path: path.to_path_buf(),
            source,
        })?;
        let roles: HashMap<CallerId, Role> =
            serde_json::from_str(&content).map_err(|source| GateError::RolesParse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Role map loaded from {:?} ({} identities)", path, roles.len());
        Ok(Self { roles })
    }

    /// Merge a comma-separated admin id list (CMD_GATE_ADMIN_IDS format).
    /// Blank items are skipped.
    pub fn merge_admin_ids(&mut self, ids: &str) {
        for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            self.insert(CallerId::new(id), Role::Admin);
        }
    }
}

impl RoleResolver for StaticRoleMap {
    fn resolve_role(&self, caller: &CallerId) -> Role {
        self.roles.get(caller).copied().unwrap_or(Role::All)
    }
}
