//! Implementation of `magpie load`.

use std::{collections::BTreeSet, fs::File, io::BufReader, process::ExitCode};

use magpie_index::{IndexError, IndexWriter, read_jsonl};

use crate::cli::{args::LoadCommand, context::CommandContext};

/// Reads feature records and commits them to the configured index.
pub fn run(ctx: &CommandContext, cmd: &LoadCommand) -> ExitCode {
    let file = match File::open(&cmd.file) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("error: could not open {}: {e}", cmd.file.display());
            return ExitCode::FAILURE;
        }
    };

    match load(ctx, BufReader::new(file), cmd.replace) {
        Ok((added, total)) => {
            println!(
                "Loaded {added} features into {} ({total} documents)",
                ctx.config.index.path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}: {e}", cmd.file.display());
            ExitCode::FAILURE
        }
    }
}

/// Loads all records in one commit. Returns the number added and the new total.
fn load(
    ctx: &CommandContext,
    reader: BufReader<File>,
    replace: bool,
) -> Result<(usize, u64), IndexError> {
    let docs = read_jsonl(reader)?;
    let mut writer = IndexWriter::open(&ctx.config.index.path, &ctx.config.search.stemmer)?;

    if replace {
        let versions: BTreeSet<(&str, u64)> = docs
            .iter()
            .map(|d| (d.collection_id.as_str(), d.collection_version))
            .collect();
        for (collection, version) in versions {
            writer.delete_collection_version(collection, version)?;
        }
    }

    writer.add_documents(&docs)?;
    writer.commit()?;
    Ok((docs.len(), writer.num_docs()?))
}
