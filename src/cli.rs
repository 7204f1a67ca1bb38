//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Talk to one or more qBittorrent Web UIs from the command line.
///
/// Servers are read from a JSON file (default
/// `$XDG_CONFIG_HOME/qbremote/servers.json`). Every command logs in lazily
/// and re-logs in once if the session expired.
#[derive(Parser, Debug)]
#[command(name = "qbremote")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Server list file (overrides the default location)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List configured servers
    Servers,

    /// Log in to a server and report the outcome
    Login {
        /// Server id
        server: u32,
    },

    /// Print the application version of one server or all of them
    Version(VersionArgs),

    /// Authenticated GET against a Web API path, printing the body
    Get {
        /// Server id
        server: u32,
        /// API path relative to the base URL (e.g. api/v2/torrents/info)
        path: String,
        /// Query parameter (repeatable)
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Authenticated form POST against a Web API path, printing the body
    Post {
        /// Server id
        server: u32,
        /// API path relative to the base URL (e.g. api/v2/torrents/pause)
        path: String,
        /// Form field (repeatable)
        #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
}

#[derive(ClapArgs, Debug, PartialEq, Eq)]
pub struct VersionArgs {
    /// Server id
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub server: Option<u32>,

    /// Query every configured server concurrently
    #[arg(long)]
    pub all: bool,
}

/// Parses `key=value`. The value may be empty and may contain `=`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
