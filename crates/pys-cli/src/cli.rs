use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pys_sdk::BackendKind;

#[derive(Parser)]
#[command(name = "pys", about = "Inspect and manage pys record stores", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with `backend`, `path` and `lock_timeout_ms`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend, overriding the config file
    #[arg(long, global = true)]
    pub backend: Option<BackendArg>,

    /// Store location, overriding the config file
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    /// Give up on a contended file lock after this many milliseconds
    #[arg(long, global = true)]
    pub lock_timeout_ms: Option<u64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendArg {
    File,
    Sqlite,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => BackendKind::File,
            BackendArg::Sqlite => BackendKind::Sqlite,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List records of one type under a parent
    Ls(LsArgs),
    /// Print one record
    Show(ShowArgs),
    /// Delete one record
    Rm(RmArgs),
    /// Print every address in the store
    Tree,
    /// Remove the whole store
    Destroy(DestroyArgs),
}

#[derive(Args)]
pub struct LsArgs {
    /// Record type name, e.g. `Book`
    pub type_name: String,
    /// Parent chain as `Type/id/Type/id...`
    #[arg(long)]
    pub under: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Full address, e.g. `Author/leo/Book/b1`
    pub address: String,
}

#[derive(Args)]
pub struct RmArgs {
    pub address: String,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Confirm removal
    #[arg(long)]
    pub yes: bool,
}
