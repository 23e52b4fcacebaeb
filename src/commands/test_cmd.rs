// Command Gate - /test
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Echoes its arguments back. Handy for checking tokenization and routing.

use crate::command::CommandNode;
use crate::registry::Services;

pub fn command(_services: &Services) -> CommandNode {
    CommandNode::new("test")
        .set_handler(|ctx, args| ctx.reply(&format!("test command executed! {}", args.join(","))))
}
