use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "smartlockd", version, about = "Smart lock daemon")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "SMARTLOCK_CONFIG",
        default_value = DEFAULT_CONFIG_PATH,
        value_name = "FILE",
        help = "Configuration file"
    )]
    pub config: PathBuf,

    #[arg(
        long,
        global = true,
        help = "Restore factory settings before starting (clears cards, PIN and master card)"
    )]
    pub factory_reset: bool,

    #[arg(long, global = true, value_name = "ADDR", help = "Admin panel listen address")]
    pub listen: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the lock (default)
    Run,
    /// Restore factory settings and exit
    Reset,
    /// Print the enrolled card table
    Cards {
        #[arg(long, help = "Output JSON")]
        json: bool,
    },
}
