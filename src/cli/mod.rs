// src/cli/mod.rs
use clap::Parser;

pub mod commands;
pub mod handlers;

pub use commands::CliCommand;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Use JSON output for one-shot commands
    #[arg(long)]
    pub json: bool,

    /// Database URL
    #[arg(long, short, env = "DATABASE_URL")]
    pub db: Option<String>,

    /// Address to bind the API server to
    #[arg(long)]
    pub host: Option<String>,

    /// API server port
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Command to execute (without one, the API server runs)
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}
