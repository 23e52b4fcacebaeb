// Command Gate - Path Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Single source of truth for where the gate keeps its JSON documents.
// Cached via OnceLock for zero-overhead repeated access.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static GATE_ROOT_CACHE: OnceLock<PathBuf> = OnceLock::new();

pub const COMMANDS_FILE: &str = "commands.json";
pub const PERMISSIONS_FILE: &str = "permissions.json";
pub const ROLES_FILE: &str = "roles.json";

/// Directory holding commands.json, permissions.json and roles.json.
///
/// Resolution order:
///   1. CMD_GATE_ROOT environment variable (if it exists on disk)
///   2. Current working directory
///   3. "." (cwd unreadable)
pub fn gate_root() -> &'static Path {
    GATE_ROOT_CACHE.get_or_init(|| {
        if let Ok(root) = std::env::var("CMD_GATE_ROOT") {
            let p = PathBuf::from(&root);
            if p.exists() {
                return p;
            }
            log::warn!("CMD_GATE_ROOT={} does not exist, falling back to cwd", root);
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    })
}

/// Persisted enable/disable configuration
pub fn commands_path() -> PathBuf {
    gate_root().join(COMMANDS_FILE)
}

/// Optional permission table override
pub fn permissions_path() -> PathBuf {
    gate_root().join(PERMISSIONS_FILE)
}

/// Optional identity → role map
pub fn roles_path() -> PathBuf {
    gate_root().join(ROLES_FILE)
}
