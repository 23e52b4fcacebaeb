// Command Gate - /admin
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Administrative tools. No handler of its own: `/admin` alone reports
// not-implemented, `/admin status` and `/admin save` do the work.

use crate::command::CommandNode;
use crate::error::GateError;
use crate::registry::Services;

pub fn command(services: &Services) -> CommandNode {
    CommandNode::new("admin")
        .add_child(status(services))
        .add_child(save(services))
}

/// Registered commands, global switches, uptime
fn status(services: &Services) -> CommandNode {
    let store = services.store.clone();
    let started_at = services.started_at;
    let names = services.command_names();

    CommandNode::new("status").set_handler(move |ctx, _args| {
        let global = store.global();
        let config = store.snapshot();
        let disabled: Vec<&str> = config
            .commands
            .iter()
            .filter(|(_, c)| !c.enabled)
            .map(|(name, _)| name.as_str())
            .collect();

        let uptime = ctx.received_at.signed_duration_since(started_at);
        let report = format!(
            "Commands: {}\nDisabled: {}\nupdateMode: {}\ndisableAllCommands: {}\nStarted: {} (up {}s)\nConfig: {:?}",
            names.join(", "),
            if disabled.is_empty() { "none".to_string() } else { disabled.join(", ") },
            global.update_mode,
            global.disable_all_commands,
            started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            uptime.num_seconds(),
            store.path(),
        );
        ctx.reply(&report)
    })
}

/// Persist the in-memory config. Failure is reported to the caller, not raised.
fn save(services: &Services) -> CommandNode {
    let store = services.store.clone();

    CommandNode::new("save").set_handler(move |ctx, _args| match store.save() {
        Ok(()) => ctx.reply("✅ Configuration saved."),
        Err(GateError::SaveInProgress) => {
            ctx.reply_error("A save is already in progress, try again shortly.");
            Ok(())
        }
        Err(e) => {
            log::error!("Admin save requested by {} failed: {}", ctx.caller, e);
            ctx.reply_error("Failed to save configuration.");
            Ok(())
        }
    })
}
