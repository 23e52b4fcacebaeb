// Command Gate - /start
// Copyright 2026 Joseph Stone - All Rights Reserved

use crate::command::CommandNode;
use crate::registry::Services;

pub fn command(_services: &Services) -> CommandNode {
    CommandNode::new("start").set_handler(|ctx, _args| {
        ctx.reply("👋 Welcome! Send /help to see what you can do here.")
    })
}
