use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caster-cli", about = "Cast value objects to and from JSON columns")]
pub struct Cli {
    /// Path to the cast configuration (.toml or .hcl).
    #[arg(long, global = true, default_value = "casts.toml", env = "CASTER_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration and list the bound columns
    Check,
    /// Turn column attributes (JSON) into stored column text
    Encode(ColumnArgs),
    /// Turn stored column text back into validated JSON
    Decode(ColumnArgs),
    /// Look up a field inside stored column text
    Get(GetArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ColumnArgs {
    #[arg(long)]
    pub model: String,

    #[arg(long)]
    pub column: String,

    /// Read from this file instead of stdin.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct GetArgs {
    /// Field path, `.` or `->` separated (`address->street`, `0.moved`).
    #[arg(long)]
    pub path: String,

    #[arg(long)]
    pub input: Option<PathBuf>,
}
