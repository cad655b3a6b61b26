//! Implementation of `magpie suggest`.

use std::process::ExitCode;

use magpie_index::CancelFlag;

use crate::cli::{
    args::SuggestCommand,
    context::CommandContext,
    output::{output_results, report_error},
};

/// Validates the arguments, searches and prints the matching features.
pub fn run(ctx: &CommandContext, cmd: &SuggestCommand) -> ExitCode {
    let service = match ctx.service() {
        Ok(service) => service,
        Err(code) => return code,
    };

    let params = match service.params(cmd.pairs()) {
        Ok(params) => params,
        Err(e) => return report_error(&e),
    };

    match service.suggest(&params, &CancelFlag::new()) {
        Ok(suggestion) => output_results(
            &suggestion.rows,
            &params.query,
            &suggestion.expression,
            params.srid,
            cmd.json,
        ),
        Err(e) => report_error(&e),
    }
}
