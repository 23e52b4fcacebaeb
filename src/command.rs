// Command Gate - Command Nodes
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// A command is a named node with an optional handler and named children
// (subcommands). Built during startup, immutable once registered.
//
// execute(): disabled? -> stop | args[0] names a child? -> recurse with
// args[1..] | handler? -> run with the remaining args | -> not implemented.

use crate::config::CommandStore;
use crate::context::CommandContext;
use crate::outcome::ExecOutcome;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Handler signature. `args` are relative to the node: tokens already
/// consumed as subcommand names are not included.
pub type Handler = Arc<dyn Fn(&CommandContext, &[String]) -> anyhow::Result<()> + Send + Sync>;

pub struct CommandNode {
    name: String,
    handler: Option<Handler>,
    children: BTreeMap<String, CommandNode>,
}

impl CommandNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handler: None,
            children: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach or replace this node's handler
    pub fn set_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandContext, &[String]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Register a subcommand. A second child with the same name replaces the first.
    pub fn add_child(mut self, child: CommandNode) -> Self {
        if let Some(previous) = self.children.insert(child.name.clone(), child) {
            log::warn!(
                "Subcommand '{} {}' registered twice, keeping the last one",
                self.name,
                previous.name
            );
        }
        self
    }

    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &CommandNode> {
        self.children.values()
    }

    /// Every tree path at or below this node, parents before children
    pub fn paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut out);
        out
    }

    fn collect_paths(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        prefix.push(self.name.clone());
        out.push(prefix.clone());
        for child in self.children.values() {
            child.collect_paths(prefix, out);
        }
        prefix.pop();
    }

    /// Run this node as a root command
    pub fn execute(&self, ctx: &CommandContext, args: &[String], store: &CommandStore) -> ExecOutcome {
        self.execute_at(&mut Vec::new(), ctx, args, store)
    }

    fn execute_at(
        &self,
        path: &mut Vec<String>,
        ctx: &CommandContext,
        args: &[String],
        store: &CommandStore,
    ) -> ExecOutcome {
        path.push(self.name.clone());

        let key: Vec<&str> = path.iter().map(String::as_str).collect();
        if !store.is_enabled(&key) {
            return ExecOutcome::Disabled { path: path.clone() };
        }

        if let Some((first, rest)) = args.split_first() {
            if let Some(child) = self.child(first) {
                return child.execute_at(path, ctx, rest, store);
            }
        }

        let Some(handler) = &self.handler else {
            return ExecOutcome::NotImplemented { path: path.clone() };
        };

        log::debug!("Running '{}' for {} with args {:?}", path.join(" "), ctx.caller, args);
        match catch_unwind(AssertUnwindSafe(|| handler(ctx, args))) {
            Ok(Ok(())) => ExecOutcome::Executed { path: path.clone() },
            Ok(Err(e)) => ExecOutcome::HandlerFailed {
                path: path.clone(),
                error: format!("{:#}", e),
            },
            Err(panic) => ExecOutcome::HandlerFailed {
                path: path.clone(),
                error: panic_message(panic.as_ref()),
            },
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("has_handler", &self.handler.is_some())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
