// Command Gate - Library Root
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// All modules exported here for use by the binary and tests.

pub mod paths;
pub mod error;
pub mod permissions;
pub mod access;
pub mod roles;
pub mod config;
pub mod context;
pub mod outcome;
pub mod command;
pub mod dispatch;
pub mod host;

// ============================================================================
// COMMANDS - static registration list
// ============================================================================

/// Built-in command trees
pub mod commands;

/// Compile-time registry feeding the dispatcher at startup
pub mod registry;

pub use command::CommandNode;
pub use context::{CallerId, CommandContext, ReplySink};
pub use dispatch::Dispatcher;
pub use outcome::DispatchOutcome;
pub use permissions::Role;
