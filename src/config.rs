// Command Gate - Command Configuration Store
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Persisted enable/disable + allow/block lists per command, nested per
// subcommand. Loaded once at startup (degrades to defaults on failure),
// extended by ensure_entry during registration, written only on explicit save.

use crate::context::CallerId;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// Process-wide switches, consulted before any per-command check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default)]
    pub update_mode: bool,
    #[serde(default)]
    pub disable_all_commands: bool,
    /// Keys this version does not know, written back untouched on save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One command's persisted settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// identity → member. Only `true` entries count.
    #[serde(default)]
    pub allow_list: BTreeMap<String, bool>,
    #[serde(default)]
    pub block_list: BTreeMap<String, bool>,
    #[serde(default)]
    pub description: String,
    /// Absent in the source stays absent on save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommands: Option<BTreeMap<String, CommandConfig>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl CommandConfig {
    /// Fresh entry: enabled, empty lists, placeholder description
    pub fn new_default(name: &str) -> Self {
        Self {
            enabled: true,
            allow_list: BTreeMap::new(),
            block_list: BTreeMap::new(),
            description: format!("Command '{}' description.", name),
            subcommands: Some(BTreeMap::new()),
            extra: Map::new(),
        }
    }

    pub fn subcommand(&self, name: &str) -> Option<&CommandConfig> {
        self.subcommands.as_ref()?.get(name)
    }

    pub fn is_allow_listed(&self, caller: &CallerId) -> bool {
        self.allow_list.get(caller.as_str()).copied().unwrap_or(false)
    }

    pub fn is_block_listed(&self, caller: &CallerId) -> bool {
        self.block_list.get(caller.as_str()).copied().unwrap_or(false)
    }
}

/// Whole commands.json document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandsConfig {
    #[serde(default)]
    pub global_config: GlobalConfig,
    #[serde(default)]
    pub commands: BTreeMap<String, CommandConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommandsConfig {
    /// Read and parse a config file. Strict: callers decide how to degrade.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GateError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| GateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Entry at a tree path, e.g. ["admin", "save"]
    pub fn lookup(&self, path: &[&str]) -> Option<&CommandConfig> {
        let (root, rest) = path.split_first()?;
        let mut entry = self.commands.get(*root)?;
        for name in rest {
            entry = entry.subcommand(name)?;
        }
        Some(entry)
    }

    /// Entry at a tree path, creating it (and any missing ancestors) with
    /// defaults. Existing entries are never touched.
    pub fn ensure_entry(&mut self, path: &[&str]) -> Option<&mut CommandConfig> {
        let (root, rest) = path.split_first()?;
        let mut entry = self
            .commands
            .entry(root.to_string())
            .or_insert_with(|| CommandConfig::new_default(root));
        for name in rest {
            entry = entry
                .subcommands
                .get_or_insert_with(BTreeMap::new)
                .entry(name.to_string())
                .or_insert_with(|| CommandConfig::new_default(name));
        }
        Some(entry)
    }
}

/// Shared, read-mostly store. One per process; handed out as Arc<CommandStore>.
#[derive(Debug)]
pub struct CommandStore {
    path: PathBuf,
    config: RwLock<CommandsConfig>,
    /// Held for the duration of a save. try_lock → at most one save in flight.
    save_guard: Mutex<()>,
}

impl CommandStore {
    /// Load from disk. Never fails: missing or corrupt file → default config.
    pub fn load(path: &Path) -> Self {
        let config = match CommandsConfig::read(path) {
            Ok(config) => {
                log::info!("Command config loaded from {:?} ({} commands)", path, config.commands.len());
                config
            }
            Err(GateError::ConfigRead { ref source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Command config not found at {:?}, using defaults", path);
                CommandsConfig::default()
            }
            Err(e) => {
                log::error!("Failed to load command config: {}. Using default configuration.", e);
                CommandsConfig::default()
            }
        };
        Self::with_config(path, config)
    }

    pub fn with_config(path: &Path, config: CommandsConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            config: RwLock::new(config),
            save_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, CommandsConfig> {
        self.config.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, CommandsConfig> {
        self.config.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the whole document
    pub fn snapshot(&self) -> CommandsConfig {
        self.read_lock().clone()
    }

    pub fn global(&self) -> GlobalConfig {
        self.read_lock().global_config.clone()
    }

    pub fn command(&self, path: &[&str]) -> Option<CommandConfig> {
        self.read_lock().lookup(path).cloned()
    }

    /// Enabled flag for a tree path. A missing entry reads as enabled,
    /// matching what ensure_entry would create.
    pub fn is_enabled(&self, path: &[&str]) -> bool {
        match self.read_lock().lookup(path) {
            Some(entry) => entry.enabled,
            None => {
                log::warn!("No config entry for '{}', treating as enabled", path.join(" "));
                true
            }
        }
    }

    /// Idempotent: creates a default entry if absent, returns the current entry.
    pub fn ensure_entry(&self, path: &[&str]) -> Option<CommandConfig> {
        let mut config = self.write_lock();
        let existed = config.lookup(path).is_some();
        let entry = config.ensure_entry(path)?.clone();
        if !existed {
            log::debug!("Created config entry for '{}'", path.join(" "));
        }
        Some(entry)
    }

    /// Write to the store's own path
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// Write the current document via a sibling temp file + rename.
    /// Rejects overlapping saves. In-memory state is never rolled back on failure.
    pub fn save_to(&self, target: &Path) -> Result<()> {
        let _guard = match self.save_guard.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                log::warn!("Config save to {:?} rejected: another save in progress", target);
                return Err(GateError::SaveInProgress);
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        // Serialize from a snapshot; no config lock is held during I/O
        let snapshot = self.snapshot();
        let content = serde_json::to_string_pretty(&snapshot).map_err(GateError::ConfigSerialize)?;

        let tmp = target.with_extension("json.tmp");
        let write_result = std::fs::write(&tmp, content).and_then(|_| std::fs::rename(&tmp, target));
        if let Err(source) = write_result {
            let _ = std::fs::remove_file(&tmp);
            log::error!("Failed to save configuration to {:?}: {}", target, source);
            return Err(GateError::ConfigWrite {
                path: target.to_path_buf(),
                source,
            });
        }

        log::info!("Configuration saved to {:?}", target);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn hold_save_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.save_guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// TESTS
// ============================================================================
