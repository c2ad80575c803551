use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fic",
    about = "File integrity checker: detect tampering through hash comparison",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Integrity database file (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Hash algorithm for newly added files (overrides the config file)
    #[arg(long, global = true)]
    pub algorithm: Option<String>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a file's fingerprint
    Add(AddArgs),
    /// Check one file against its recorded fingerprint
    Verify(VerifyArgs),
    /// Check every tracked file
    VerifyAll(VerifyAllArgs),
    /// List tracked files
    List(ListArgs),
    /// Stop tracking a file
    Remove(RemoveArgs),
    /// Write the database to another file
    Export(ExportArgs),
    /// Replace or merge the database from another file
    Import(ImportArgs),
}

#[derive(Args)]
pub struct AddArgs {
    pub path: PathBuf,
    pub description: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct VerifyAllArgs {}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct RemoveArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    pub path: PathBuf,
    /// `merge` (any case) keeps existing records; anything else replaces
    /// the database
    pub mode: Option<String>,
}
