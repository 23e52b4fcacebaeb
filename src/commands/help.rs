// Command Gate - /help
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Lists enabled root commands the caller is allowed to run, with the
// description from commands.json.

use crate::command::CommandNode;
use crate::registry::Services;

pub fn command(services: &Services) -> CommandNode {
    let store = services.store.clone();
    let access = services.access.clone();
    let names = services.command_names();

    CommandNode::new("help").set_handler(move |ctx, _args| {
        let mut lines = Vec::new();
        for name in &names {
            let Some(config) = store.command(&[*name]) else {
                continue;
            };
            if !config.enabled {
                continue;
            }
            if !access.evaluate(ctx.role, name, &ctx.caller, Some(&config)).allowed() {
                continue;
            }
            lines.push(format!("/{} - {}", name, config.description));
        }

        if lines.is_empty() {
            ctx.reply("No commands available.")
        } else {
            ctx.reply(&format!("Available commands:\n{}", lines.join("\n")))
        }
    })
}
