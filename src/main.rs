// Command Gate - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and stdio host. Every command message routes through the gate.
// Usage:
//   cmd-gate serve                          # JSON lines on stdin -> replies on stdout
//   cmd-gate dispatch <caller> <text>       # One-shot dispatch, prints replies + outcome
//   cmd-gate check <role> <command>         # Permission table lookup
//   cmd-gate config show                    # Effective commands.json after registration
//   cmd-gate config init                    # Write commands.json with every built-in entry

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cmd_gate::{
    access::AccessControl,
    config::CommandStore,
    context::{CallerId, RecordingSink, ReplySink},
    dispatch::Dispatcher,
    host::{self, JsonLineSink},
    paths,
    permissions::{PermissionTable, Role},
    registry::{self, Services},
    roles::StaticRoleMap,
};
use std::path::PathBuf;
use std::sync::Arc;

const ADMIN_IDS_ENV: &str = "CMD_GATE_ADMIN_IDS";

#[derive(Parser)]
#[command(name = "cmd-gate")]
#[command(author = "Joseph Stone")]
#[command(version = "0.1.0")]
#[command(about = "Command Gate - role-gated command dispatcher")]
struct Cli {
    /// Command configuration (enable/disable, allow/block lists)
    #[arg(short, long, default_value_os_t = paths::commands_path())]
    config: PathBuf,

    /// Permission table (built-in table if the file is absent)
    #[arg(short, long, default_value_os_t = paths::permissions_path())]
    permissions: PathBuf,

    /// Identity -> role map (merged with CMD_GATE_ADMIN_IDS)
    #[arg(short, long, default_value_os_t = paths::roles_path())]
    roles: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read JSON messages from stdin, write replies to stdout
    Serve,

    /// Dispatch a single message and print what happened
    Dispatch {
        /// Caller identity
        caller: String,

        /// Message text, e.g. "/admin status"
        #[arg(num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Show whether a role may run a root command
    Check {
        /// admin | member | all
        role: String,

        /// Root command name without the leading '/'
        command: String,
    },

    /// Inspect or materialize commands.json
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config (loaded file + entries for every built-in)
    Show,

    /// Register built-ins and save the result to --config
    Init,
}

/// Load documents, register built-ins. Returns the frozen dispatcher.
fn build_gate(cli: &Cli, sink: Arc<dyn ReplySink>) -> Result<Dispatcher> {
    let table = PermissionTable::load(&cli.permissions)
        .with_context(|| format!("Failed to load permission table {:?}", cli.permissions))?;
    let access = AccessControl::new(table);

    let mut roles = StaticRoleMap::load(&cli.roles)
        .with_context(|| format!("Failed to load role map {:?}", cli.roles))?;
    if let Ok(ids) = std::env::var(ADMIN_IDS_ENV) {
        roles.merge_admin_ids(&ids);
    }
    log::info!("{} identities with an explicit role", roles.len());

    // Never fails: missing/corrupt config degrades to defaults
    let store = Arc::new(CommandStore::load(&cli.config));

    let services = Services::new(store.clone(), access.clone());
    let mut dispatcher = Dispatcher::new(store, access, Arc::new(roles), sink);
    registry::register_builtins(&mut dispatcher, &services);
    Ok(dispatcher)
}

fn main() -> Result<()> {
    // Initialize logging (safe if already init)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve => {
            let dispatcher = build_gate(&cli, Arc::new(JsonLineSink::stdout()))?;
            log::info!("Serving commands: {}", dispatcher.command_names().join(", "));
            let stdin = std::io::stdin();
            host::serve(&dispatcher, stdin.lock());
        }

        Commands::Dispatch { caller, text } => {
            let sink = Arc::new(RecordingSink::new());
            let dispatcher = build_gate(&cli, sink.clone())?;
            let outcome = dispatcher.dispatch(&text.join(" "), &CallerId::new(caller.as_str()));

            for (to, message) in sink.replies() {
                println!("-> {}: {}", to, message);
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if !outcome.is_executed() {
                std::process::exit(1);
            }
        }

        Commands::Check { role, command } => {
            let Some(role) = Role::parse(role) else {
                bail!("Unknown role '{}' (expected admin, member or all)", role);
            };
            let table = PermissionTable::load(&cli.permissions)
                .with_context(|| format!("Failed to load permission table {:?}", cli.permissions))?;
            let allowed = AccessControl::new(table).has_access(role, command);
            println!("{} /{}: {}", role, command, if allowed { "ALLOWED" } else { "DENIED" });

            if !allowed {
                std::process::exit(1);
            }
        }

        Commands::Config { action } => {
            let dispatcher = build_gate(&cli, Arc::new(RecordingSink::new()))?;
            match action {
                ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&dispatcher.store().snapshot())?);
                }
                ConfigAction::Init => {
                    dispatcher
                        .store()
                        .save()
                        .with_context(|| format!("Failed to save config to {:?}", cli.config))?;
                    println!("Command config written to {:?}", cli.config);
                }
            }
        }
    }

    Ok(())
}
