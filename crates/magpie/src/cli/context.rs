//! Shared context for running CLI commands.

use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use magpie::SuggestService;
use magpie_config::{CONFIG_FILENAME, Config};
use magpie_query::QueryExpander;

use super::output::report_error;

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// The configuration file that was loaded.
    pub config_path: PathBuf,
    /// Loaded and validated configuration.
    pub config: Config,
}

impl CommandContext {
    /// Loads configuration from `explicit`, or discovers it from the current directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ExitCode> {
        let loaded = match explicit {
            Some(path) => Config::load_from_file(path).map(|config| (config, path.to_path_buf())),
            None => {
                let cwd = current_dir_or_failure()?;
                Config::discover(&cwd).map(|config| {
                    let path = config
                        .config_root
                        .as_deref()
                        .unwrap_or(&cwd)
                        .join(CONFIG_FILENAME);
                    (config, path)
                })
            }
        };

        match loaded {
            Ok((config, path)) => Ok(Self {
                config_path: path,
                config,
            }),
            Err(e) => {
                eprintln!("error: failed to load configuration: {e}");
                Err(ExitCode::FAILURE)
            }
        }
    }

    /// Loads the dictionaries into a query expander.
    pub fn expander(&self) -> Result<QueryExpander, ExitCode> {
        QueryExpander::from_config(&self.config.dictionaries, &self.config.search)
            .map_err(|e| {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            })
    }

    /// Loads the dictionaries and opens the index.
    pub fn service(&self) -> Result<SuggestService, ExitCode> {
        SuggestService::from_config(&self.config).map_err(|e| report_error(&e))
    }
}

/// Returns the current working directory or exits with a consistent error.
fn current_dir_or_failure() -> Result<PathBuf, ExitCode> {
    env::current_dir().map_err(|e| {
        eprintln!("error: could not determine current directory: {e}");
        ExitCode::FAILURE
    })
}
