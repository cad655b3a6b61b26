//! Implementation of `magpie check`.

use std::{path::Path, process::ExitCode};

use magpie_index::{SearchExecutor, parse_language};

use crate::cli::context::CommandContext;

/// Prints a dictionary location and whether it is configured.
fn print_dictionary(label: &str, path: Option<&Path>) {
    match path {
        Some(path) => println!("  {label}: {}", path.display()),
        None => println!("  {label}: (none)"),
    }
}

/// Loads configuration, dictionaries and index, reporting what it finds.
///
/// A missing index is reported but is not an error; anything that would stop
/// `suggest` from starting is.
pub fn run(ctx: &CommandContext) -> ExitCode {
    let config = &ctx.config;

    println!("Config file: {}", ctx.config_path.display());
    println!();

    println!("Dictionaries:");
    print_dictionary("rewrites", config.dictionaries.rewrites.as_deref());
    print_dictionary("synonyms", config.dictionaries.synonyms.as_deref());
    let expander = match ctx.expander() {
        Ok(expander) => expander,
        Err(code) => return code,
    };
    println!(
        "  {} synonym keys, variant cap {}",
        expander.synonyms().len(),
        config.search.max_variants
    );
    println!();

    if let Err(e) = parse_language(&config.search.stemmer) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    let index_path = &config.index.path;
    if index_path.exists() {
        match SearchExecutor::open(index_path, &config.search) {
            Ok(executor) => println!(
                "Index: {} ({} documents)",
                index_path.display(),
                executor.num_docs()
            ),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Index: {} (not built yet)", index_path.display());
    }
    println!();

    println!("Effective settings:");
    print!("{}", config.settings_to_toml());
    println!();
    println!("No issues found.");
    ExitCode::SUCCESS
}
