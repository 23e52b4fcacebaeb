// Command Gate - Command Registry
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Compile-time list of built-in commands. Every entry is registered before
// the dispatcher serves its first message. Adding a command = adding a line.

use crate::access::AccessControl;
use crate::command::CommandNode;
use crate::commands::{admin, help, start, test_cmd};
use crate::config::CommandStore;
use crate::dispatch::Dispatcher;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared services handed to command constructors
#[derive(Clone)]
pub struct Services {
    pub store: Arc<CommandStore>,
    pub access: AccessControl,
    pub started_at: DateTime<Utc>,
}

impl Services {
    pub fn new(store: Arc<CommandStore>, access: AccessControl) -> Self {
        Self {
            store,
            access,
            started_at: Utc::now(),
        }
    }

    /// Names of every built-in root command, in registration order
    pub fn command_names(&self) -> Vec<&'static str> {
        BUILTIN.iter().map(|(name, _)| *name).collect()
    }
}

pub type Registration = fn(&Services) -> CommandNode;

pub const BUILTIN: &[(&str, Registration)] = &[
    ("start", start::command),
    ("test", test_cmd::command),
    ("help", help::command),
    ("admin", admin::command),
];

/// Build every built-in command tree
pub fn builtin_commands(services: &Services) -> Vec<CommandNode> {
    BUILTIN
        .iter()
        .map(|(name, build)| {
            let node = build(services);
            if node.name() != *name {
                log::warn!("Registry entry '{}' built a command named '{}'", name, node.name());
            }
            node
        })
        .collect()
}

/// Register all built-ins. Returns how many root commands were registered.
pub fn register_builtins(dispatcher: &mut Dispatcher, services: &Services) -> usize {
    let nodes = builtin_commands(services);
    let count = nodes.len();
    for node in nodes {
        dispatcher.register(node);
    }
    log::info!("Registered {} built-in commands", count);
    count
}
