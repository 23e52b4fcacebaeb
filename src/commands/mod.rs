// Command Gate - Built-in Commands
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// One file per root command. Each exposes `command(&Services) -> CommandNode`
// and is listed in registry::BUILTIN.

pub mod admin;
pub mod help;
pub mod start;
pub mod test_cmd;

// ============================================================================
// TESTS
// ============================================================================
