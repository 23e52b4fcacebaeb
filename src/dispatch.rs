// Command Gate - Dispatcher (Primary Enforcement Point)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Every inbound message passes through here.
// Tokenize -> resolve role -> root lookup -> global switches -> access check
// -> node execution -> report. Access is checked once, at the root.
// Handler failures stop here: one bad handler never takes down dispatch.

use crate::access::AccessControl;
use crate::command::CommandNode;
use crate::config::CommandStore;
use crate::context::{CallerId, CommandContext, ReplySink};
use crate::outcome::DispatchOutcome;
use crate::permissions::Role;
use crate::roles::RoleResolver;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Leading marker that makes a message a command
pub const COMMAND_MARKER: char = '/';

/// Parsed command line: name without marker or @bot suffix, then raw args
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
}

/// Split on whitespace. First token must start with the marker.
/// `/start@MyBot a b` -> name "start", args ["a", "b"].
pub fn tokenize(text: &str) -> Option<CommandLine> {
    let mut tokens = text.split_whitespace();
    let head = tokens.next()?.strip_prefix(COMMAND_MARKER)?;
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some(CommandLine {
        name: name.to_string(),
        args: tokens.map(str::to_string).collect(),
    })
}

/// Owns the root command nodes plus the injected capabilities.
/// Registration needs `&mut self`; once shared behind an Arc the tree is frozen.
pub struct Dispatcher {
    roots: BTreeMap<String, CommandNode>,
    store: Arc<CommandStore>,
    access: AccessControl,
    roles: Arc<dyn RoleResolver>,
    sink: Arc<dyn ReplySink>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<CommandStore>,
        access: AccessControl,
        roles: Arc<dyn RoleResolver>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            roots: BTreeMap::new(),
            store,
            access,
            roles,
            sink,
        }
    }

    /// Register a root command. Ensures a config entry exists for the node
    /// and every subcommand. Same name twice: last registration wins.
    pub fn register(&mut self, node: CommandNode) {
        for path in node.paths() {
            let key: Vec<&str> = path.iter().map(String::as_str).collect();
            self.store.ensure_entry(&key);
        }
        let subcommands = node.children().count();
        log::info!("Loaded command: {}, subcommands: {}", node.name(), subcommands);
        if let Some(previous) = self.roots.insert(node.name().to_string(), node) {
            log::warn!("Command '{}' registered twice, keeping the last one", previous.name());
        }
    }

    pub fn store(&self) -> &Arc<CommandStore> {
        &self.store
    }

    pub fn command(&self, name: &str) -> Option<&CommandNode> {
        self.roots.get(name)
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.roots.keys().map(String::as_str).collect()
    }

    /// Handle one inbound message end to end. Never panics on handler failure.
    pub fn dispatch(&self, text: &str, caller: &CallerId) -> DispatchOutcome {
        let Some(line) = tokenize(text) else {
            return DispatchOutcome::Ignored;
        };
        log::debug!("ARGS: {:?}", line.args);

        let role = self.roles.resolve_role(caller);
        let ctx = CommandContext::new(caller.clone(), role, text, self.sink.clone());

        let Some(root) = self.roots.get(&line.name) else {
            log::debug!("Unknown command '{}' from {}", line.name, caller);
            return DispatchOutcome::Ignored;
        };

        let outcome = self.gate(&ctx, &line).unwrap_or_else(|| root.execute(&ctx, &line.args, &self.store).into());

        match &outcome {
            DispatchOutcome::HandlerFailed { path, error } => {
                log::error!("Handler '{}' failed for {}: {}", path.join(" "), caller, error);
            }
            other => log::info!("{} | caller={} role={}", other, caller, role),
        }

        if let Some(message) = outcome.user_message() {
            ctx.reply_error(&message);
        }
        outcome
    }

    /// Checks that run before the tree is entered. Some(outcome) = stop.
    fn gate(&self, ctx: &CommandContext, line: &CommandLine) -> Option<DispatchOutcome> {
        let global = self.store.global();
        if global.disable_all_commands {
            return Some(DispatchOutcome::AllCommandsDisabled);
        }
        if global.update_mode && ctx.role != Role::Admin {
            return Some(DispatchOutcome::UpdateMode);
        }

        let config = self.store.command(&[line.name.as_str()]);
        let decision = self.access.evaluate(ctx.role, &line.name, &ctx.caller, config.as_ref());
        if !decision.allowed() {
            log::debug!("Access {:?} for {} on '{}'", decision, ctx.caller, line.name);
            return Some(DispatchOutcome::PermissionDenied {
                command: line.name.clone(),
            });
        }
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommandsConfig, GlobalConfig};
    use crate::context::RecordingSink;
    use crate::permissions::{PermissionTable, WILDCARD};
    use crate::roles::StaticRoleMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const ADMIN: &str = "1";
    const MEMBER: &str = "2";
    const STRANGER: &str = "3";

    struct Harness {
        dispatcher: Dispatcher,
        sink: Arc<RecordingSink>,
        runs: Arc<AtomicUsize>,
        seen_args: Arc<Mutex<Vec<Vec<String>>>>,
    }

    fn harness(config: CommandsConfig, table: PermissionTable) -> Harness {
        let store = Arc::new(CommandStore::with_config(Path::new("unused.json"), config));
        let roles = StaticRoleMap::new().with(ADMIN, Role::Admin).with(MEMBER, Role::Member);
        let sink = Arc::new(RecordingSink::new());
        let mut dispatcher = Dispatcher::new(store, AccessControl::new(table), Arc::new(roles), sink.clone());

        let runs = Arc::new(AtomicUsize::new(0));
        let seen_args = Arc::new(Mutex::new(Vec::new()));
        for name in ["start", "admin", "test"] {
            let runs = runs.clone();
            dispatcher.register(CommandNode::new(name).set_handler(move |ctx, _args| {
                runs.fetch_add(1, Ordering::SeqCst);
                ctx.reply("ok")
            }));
        }
        let seen = seen_args.clone();
        dispatcher.register(
            CommandNode::new("parent")
                .set_handler(|ctx, _| ctx.reply("parent"))
                .add_child(CommandNode::new("child").set_handler(move |ctx, args| {
                    seen.lock().unwrap().push(args.to_vec());
                    ctx.reply("child")
                })),
        );
        dispatcher.register(CommandNode::new("broken").set_handler(|_, _| anyhow::bail!("db down")));

        Harness { dispatcher, sink, runs, seen_args }
    }

    fn member_table() -> PermissionTable {
        PermissionTable::builder()
            .rule(Role::Member, "start", true)
            .rule(Role::Member, WILDCARD, false)
            .rule(Role::Admin, WILDCARD, true)
            .build()
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tokenize_strips_marker_and_bot_suffix() {
        let line = tokenize("/parent child  extra").unwrap();
        assert_eq!(line.name, "parent");
        assert_eq!(line.args, path(&["child", "extra"]));

        assert_eq!(tokenize("/start@MyBot").unwrap().name, "start");
        assert_eq!(tokenize("  /help  ").unwrap().args.len(), 0);
        assert!(tokenize("hello /start").is_none());
        assert!(tokenize("/").is_none());
        assert!(tokenize("/@bot").is_none());
        assert!(tokenize("").is_none());
    }

    #[test]
    fn registration_ensures_config_entries() {
        let h = harness(CommandsConfig::default(), member_table());
        let store = h.dispatcher.store();
        assert!(store.command(&["start"]).unwrap().enabled);
        assert!(store.command(&["parent", "child"]).is_some());
        assert!(store.command(&["child"]).is_none());
        assert_eq!(h.dispatcher.command_names(), vec!["admin", "broken", "parent", "start", "test"]);
    }

    #[test]
    fn member_with_exact_entry_runs_handler() {
        let h = harness(CommandsConfig::default(), member_table());
        let outcome = h.dispatcher.dispatch("/start", &CallerId::new(MEMBER));
        assert_eq!(outcome, DispatchOutcome::Executed { path: path(&["start"]) });
        assert_eq!(h.runs.load(Ordering::SeqCst), 1);
        assert_eq!(h.sink.messages(), vec!["ok".to_string()]);
    }

    #[test]
    fn member_falls_to_wildcard_deny() {
        let h = harness(CommandsConfig::default(), member_table());
        let outcome = h.dispatcher.dispatch("/admin", &CallerId::new(MEMBER));
        assert_eq!(outcome, DispatchOutcome::PermissionDenied { command: "admin".into() });
        assert_eq!(h.runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.sink.messages(),
            vec!["❌ You do not have permission to use this command.".to_string()]
        );
    }

    #[test]
    fn disabled_command_wins_over_full_access() {
        let mut config = CommandsConfig::default();
        config.ensure_entry(&["test"]).unwrap().enabled = false;
        let h = harness(config, member_table());

        let outcome = h.dispatcher.dispatch("/test", &CallerId::new(ADMIN));
        assert_eq!(outcome, DispatchOutcome::Disabled { path: path(&["test"]) });
        assert_eq!(h.runs.load(Ordering::SeqCst), 0);
        assert_eq!(h.sink.messages(), vec!["❌ Command 'test' is disabled.".to_string()]);
    }

    #[test]
    fn handler_sees_raw_text_and_resolved_role() {
        let mut h = harness(CommandsConfig::default(), member_table());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        h.dispatcher.register(CommandNode::new("echo").set_handler(move |ctx, _| {
            record.lock().unwrap().push((ctx.text.clone(), ctx.role));
            Ok(())
        }));

        h.dispatcher.dispatch("/echo@MyBot  a b", &CallerId::new(ADMIN));
        assert_eq!(*seen.lock().unwrap(), vec![("/echo@MyBot  a b".to_string(), Role::Admin)]);
    }

    #[test]
    fn nested_dispatch_passes_relative_args() {
        let h = harness(CommandsConfig::default(), member_table());
        let outcome = h.dispatcher.dispatch("/parent child extra", &CallerId::new(ADMIN));
        assert_eq!(outcome, DispatchOutcome::Executed { path: path(&["parent", "child"]) });
        assert_eq!(*h.seen_args.lock().unwrap(), vec![path(&["extra"])]);
        assert_eq!(h.sink.messages(), vec!["child".to_string()]);
    }

    #[test]
    fn unknown_command_and_plain_text_are_ignored() {
        let h = harness(CommandsConfig::default(), member_table());
        assert_eq!(h.dispatcher.dispatch("/nope", &CallerId::new(ADMIN)), DispatchOutcome::Ignored);
        assert_eq!(h.dispatcher.dispatch("just chatting", &CallerId::new(ADMIN)), DispatchOutcome::Ignored);
        assert!(h.sink.replies().is_empty());
    }

    #[test]
    fn anonymous_caller_denied_by_default() {
        let h = harness(CommandsConfig::default(), member_table());
        let outcome = h.dispatcher.dispatch("/start", &CallerId::new(STRANGER));
        assert!(matches!(outcome, DispatchOutcome::PermissionDenied { .. }));
    }

    #[test]
    fn handler_failure_is_contained_and_reported() {
        let h = harness(CommandsConfig::default(), member_table());
        let outcome = h.dispatcher.dispatch("/broken", &CallerId::new(ADMIN));
        assert!(matches!(outcome, DispatchOutcome::HandlerFailed { .. }));
        assert_eq!(
            h.sink.messages(),
            vec!["❌ An unexpected error occurred. Please try again later.".to_string()]
        );

        // Dispatcher still serves the next message
        let next = h.dispatcher.dispatch("/start", &CallerId::new(MEMBER));
        assert!(next.is_executed());
    }

    #[test]
    fn disable_all_commands_blocks_everyone() {
        let config = CommandsConfig {
            global_config: GlobalConfig { disable_all_commands: true, ..Default::default() },
            ..Default::default()
        };
        let h = harness(config, member_table());
        assert_eq!(
            h.dispatcher.dispatch("/start", &CallerId::new(ADMIN)),
            DispatchOutcome::AllCommandsDisabled
        );
        assert_eq!(h.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn update_mode_lets_only_admins_through() {
        let config = CommandsConfig {
            global_config: GlobalConfig { update_mode: true, ..Default::default() },
            ..Default::default()
        };
        let h = harness(config, member_table());
        assert_eq!(h.dispatcher.dispatch("/start", &CallerId::new(MEMBER)), DispatchOutcome::UpdateMode);
        assert!(h.dispatcher.dispatch("/start", &CallerId::new(ADMIN)).is_executed());
    }

    #[test]
    fn block_and_allow_lists_apply_at_root() {
        let mut config = CommandsConfig::default();
        config.ensure_entry(&["start"]).unwrap().block_list.insert(MEMBER.into(), true);
        config.ensure_entry(&["admin"]).unwrap().allow_list.insert(MEMBER.into(), true);
        let h = harness(config, member_table());

        assert!(matches!(
            h.dispatcher.dispatch("/start", &CallerId::new(MEMBER)),
            DispatchOutcome::PermissionDenied { .. }
        ));
        assert!(h.dispatcher.dispatch("/admin", &CallerId::new(MEMBER)).is_executed());
    }

    #[test]
    fn access_checked_once_at_root_only() {
        // Member may run "parent"; no rule for "child" is consulted
        let table = PermissionTable::builder()
            .rule(Role::Member, "parent", true)
            .rule(Role::Member, "child", false)
            .rule(Role::Member, WILDCARD, false)
            .build();
        let h = harness(CommandsConfig::default(), table);
        let outcome = h.dispatcher.dispatch("/parent child", &CallerId::new(MEMBER));
        assert_eq!(outcome, DispatchOutcome::Executed { path: path(&["parent", "child"]) });
    }

    #[test]
    fn duplicate_root_registration_last_wins() {
        let mut h = harness(CommandsConfig::default(), member_table());
        h.dispatcher.register(CommandNode::new("start").set_handler(|ctx, _| ctx.reply("second")));
        h.dispatcher.dispatch("/start", &CallerId::new(MEMBER));
        assert_eq!(h.sink.messages(), vec!["second".to_string()]);
        assert_eq!(h.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_dispatch_shares_one_tree() {
        let h = harness(CommandsConfig::default(), member_table());
        let dispatcher = &h.dispatcher;
        std::thread::scope(|scope| {
            for i in 0..8 {
                scope.spawn(move || {
                    let caller = if i % 2 == 0 { ADMIN } else { MEMBER };
                    assert!(dispatcher.dispatch("/start", &CallerId::new(caller)).is_executed());
                });
            }
        });
        assert_eq!(h.runs.load(Ordering::SeqCst), 8);
        assert_eq!(h.sink.replies().len(), 8);
    }
}
