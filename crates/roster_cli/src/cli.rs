use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and seed a member/team roster database.")]
pub struct Cli {
    /// Database file; overrides `database.path` from the config.
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Path to the TOML configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory for rolling log files. Logs go to stderr when unset.
    #[arg(long = "log-dir", value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error|off
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Insert `user0..userN` with age equal to the index.
    Seed {
        #[arg(long, default_value_t = 100)]
        count: u32,
        /// Create this team and put every seeded member in it.
        #[arg(long)]
        team: Option<String>,
    },
    /// Print one member's user name.
    Show { id: i64 },
    /// Print one page of members as JSON.
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Defaults to `paging.default_size`.
        #[arg(long)]
        size: Option<u32>,
        /// Sort property: id, user_name or age.
        #[arg(long)]
        sort: Option<String>,
        /// Descending order; without `--sort` it reverses `user_name`.
        #[arg(long, action = ArgAction::SetTrue)]
        desc: bool,
    },
    /// Increment the age of every member at or above the threshold.
    BulkAgePlus { threshold: u32 },
}
