//! Clap argument definitions for the `magpie` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Splits `name=value` into its parts; the value is validated later.
fn parse_collection(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "magpie")]
#[command(about = "Location suggestions with dictionary-driven query expansion")]
pub struct Cli {
    /// Configuration file [default: magpie.toml in the current directory or above]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported `magpie` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Suggest features matching a search text
    Suggest(SuggestCommand),

    /// Show the boolean match expression a search text expands to
    Expand(ExpandCommand),

    /// Load feature records (JSON lines) into the index
    Load(LoadCommand),

    /// Validate configuration and dictionaries
    Check,
}

/// Arguments for `magpie suggest`.
#[derive(Args, Debug, Clone)]
pub struct SuggestCommand {
    /// Search text
    pub query: String,

    /// Collection to search, as NAME=VERSION (repeatable)
    #[arg(short = 'c', long = "collection", value_parser = parse_collection)]
    pub collections: Vec<(String, String)>,

    /// Weight of a collection's hits, as NAME=RELEVANCE between 0 and 1 (repeatable)
    #[arg(short = 'r', long = "relevance", value_parser = parse_collection)]
    pub relevance: Vec<(String, String)>,

    /// Maximum results [default: settings.default_limit]
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    pub limit: Option<String>,

    /// Output CRS, e.g. http://www.opengis.net/def/crs/EPSG/0/28992
    #[arg(long)]
    pub crs: Option<String>,

    /// Only features intersecting MINX,MINY,MAXX,MAXY
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// CRS of --bbox [default: WGS84]
    #[arg(long = "bbox-crs")]
    pub bbox_crs: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl SuggestCommand {
    /// The arguments as request parameters.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("q".to_string(), self.query.clone())];
        pairs.extend(
            self.collections
                .iter()
                .map(|(name, version)| (format!("{name}[version]"), version.clone())),
        );
        pairs.extend(
            self.relevance
                .iter()
                .map(|(name, relevance)| (format!("{name}[relevance]"), relevance.clone())),
        );
        let optional = [
            ("limit", &self.limit),
            ("crs", &self.crs),
            ("bbox", &self.bbox),
            ("bbox-crs", &self.bbox_crs),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v))),
        );
        pairs
    }
}

/// Arguments for `magpie expand`.
#[derive(Args, Debug, Clone)]
pub struct ExpandCommand {
    /// Search text
    pub query: String,

    /// Also list each token's variants, as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `magpie load`.
#[derive(Args, Debug, Clone)]
pub struct LoadCommand {
    /// File with one feature record per line
    pub file: PathBuf,

    /// Drop collection versions present in the file before loading
    #[arg(long)]
    pub replace: bool,
}
