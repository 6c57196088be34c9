use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "fortimap")]
#[command(about = "Reconcile FortiManager configuration objects with typed state")]
pub struct Cli {
    /// Settings file. Defaults to ./fortimap.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log decode and encode steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// List resource schemas or show one as a field tree.
    Schemas(SchemasArgs),
    /// Decode a wire object into typed state.
    Decode(DecodeArgs),
    /// Encode typed state into a request body.
    Encode(EncodeArgs),
    /// Read one object from a device store into typed state.
    Read(ReadArgs),
    /// Create or update an object in a device store from typed state.
    Apply(ApplyArgs),
    /// Delete an object from a device store.
    Delete(DeleteArgs),
}

#[derive(Parser, Debug)]
pub struct SchemasArgs {
    /// Show this resource as a field tree instead of listing all.
    #[arg(long)]
    pub resource: Option<String>,
    #[arg(long, default_value_t = 3)]
    pub depth: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct DecodeArgs {
    pub resource: String,
    /// Wire object (JSON, kebab-case keys).
    pub wire: PathBuf,
    /// Existing typed state the decode starts from.
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Always decode repeated blocks, even ones absent from state.
    #[arg(long)]
    pub import_table: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Print only the outcome counts.
    #[arg(long)]
    pub summary: bool,
    /// Write the decoded typed state here.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct EncodeArgs {
    pub resource: String,
    /// Typed state (JSON, local names).
    pub state: PathBuf,
    /// Last known state; differences from it count as pending changes.
    #[arg(long)]
    pub prior: Option<PathBuf>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ReadArgs {
    pub resource: String,
    pub key: String,
    /// Device object store (JSON file).
    #[arg(long)]
    pub store: PathBuf,
    #[arg(long)]
    pub state: Option<PathBuf>,
    #[arg(long)]
    pub import_table: bool,
    /// Correlation parameter, e.g. `--param adom=root`.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    pub resource: String,
    pub state: PathBuf,
    #[arg(long)]
    pub store: PathBuf,
    #[arg(long)]
    pub prior: Option<PathBuf>,
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
    /// Write the refreshed typed state here.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    pub resource: String,
    pub key: String,
    #[arg(long)]
    pub store: PathBuf,
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_param;

    #[test]
    fn params_split_on_first_equals() {
        assert_eq!(
            parse_param("pkg=a=b").expect("param"),
            ("pkg".to_string(), "a=b".to_string())
        );
        assert!(parse_param("adom").is_err());
        assert!(parse_param("=root").is_err());
    }
}
