//! Implementation of `magpie expand`.

use std::process::ExitCode;

use magpie_query::BooleanQueryRenderer;

use crate::cli::{args::ExpandCommand, context::CommandContext, output::output_expansion};

/// Prints the match expression a search text expands to. Needs no index.
pub fn run(ctx: &CommandContext, cmd: &ExpandCommand) -> ExitCode {
    let expander = match ctx.expander() {
        Ok(expander) => expander,
        Err(code) => return code,
    };

    let expanded = expander.expand(&cmd.query);
    let expression = BooleanQueryRenderer::render(&expanded);
    output_expansion(&cmd.query, &expanded, &expression, cmd.json)
}
