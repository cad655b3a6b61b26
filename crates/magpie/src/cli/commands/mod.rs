//! Command implementations and dispatch.

pub mod check;
pub mod expand;
pub mod load;
pub mod suggest;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Suggest(cmd) => suggest::run(ctx, &cmd),
        Commands::Expand(cmd) => expand::run(ctx, &cmd),
        Commands::Load(cmd) => load::run(ctx, &cmd),
        Commands::Check => check::run(ctx),
    }
}
