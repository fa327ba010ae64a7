use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// GraphQL backend-for-frontend for the Bluedit REST API.
#[derive(Parser)]
#[command(
    name = "bluedit-bff",
    version,
    about = "GraphQL backend-for-frontend for the Bluedit REST API",
    after_help = "Use 'bluedit-bff <command> --help' for more information about a command.",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Global options available to all subcommands.
#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Configuration file path [env: BLUEDIT_CONFIG]
    #[arg(short = 'c', long = "config", global = true, env = "BLUEDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output [env: NO_COLOR]
    #[arg(long = "no-color", global = true, env = "NO_COLOR")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the GraphQL gateway
    Serve(ServeArgs),

    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Arguments for `bluedit-bff serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config and PORT)
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Host address to bind
    #[arg(short = 'H', long = "host")]
    pub host: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration with secrets redacted
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
    pub format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}
