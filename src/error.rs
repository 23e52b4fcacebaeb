// Command Gate - Errors
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Load/save failures for the persisted documents. User-facing outcomes
// (denied, disabled, not implemented) are NOT errors, see outcome.rs.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("failed to read command config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse command config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize command config: {0}")]
    ConfigSerialize(#[source] serde_json::Error),
    #[error("failed to write command config {path:?}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a config save is already in progress")]
    SaveInProgress,
    #[error("failed to read permission table {path:?}: {source}")]
    PermissionsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse permission table {path:?}: {source}")]
    PermissionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read role map {path:?}: {source}")]
    RolesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse role map {path:?}: {source}")]
    RolesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, GateError>;
