use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "objfs",
    about = "Read, write and list objects through store-object:// URLs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Client configuration file (defaults to /etc/objfs/objfs.toml)
    #[arg(long, global = true, env = "OBJFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cluster to connect to
    #[arg(long, global = true, env = "OBJFS_CLUSTER")]
    pub cluster: Option<String>,

    /// Identity to connect as
    #[arg(long, global = true, env = "OBJFS_USER")]
    pub user: Option<String>,

    /// Extra backend argument, e.g. --client-arg=--data-root=/srv/objfs (repeatable)
    #[arg(long = "client-arg", global = true, allow_hyphen_values = true)]
    pub client_args: Vec<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Print per-pool I/O counters when the command finishes
    #[arg(long, global = true)]
    pub stats: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Copy an object to stdout
    Cat(UrlArgs),
    /// Replace an object with the contents of stdin or a file
    Put(UploadArgs),
    /// Append stdin or a file to an object
    Append(UploadArgs),
    /// List the entries below a path
    Ls(UrlArgs),
    /// Delete an object
    Rm(UrlArgs),
    /// Show the size of an object
    Stat(UrlArgs),
}

#[derive(Args)]
pub struct UrlArgs {
    /// Object URL, e.g. store-object://pool/path/to/object
    pub url: String,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Object URL, e.g. store-object://pool/path/to/object
    pub url: String,
    /// Read data from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}
