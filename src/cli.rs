// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sdiary - A secret diary with shareable links",
    long_about = "sdiary keeps short personal notes about the people in your life. Each entry is published behind an unguessable link that its recipient can open without an account, while the diary itself is only reachable after signing in with an emailed magic link."
)]
pub struct Cli {
    /// Path to the SQLite database.
    /// Defaults to $SDIARY_DB_PATH, then ~/.config/sdiary/sdiary.db.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Path to a .env file, loaded if it exists.
    #[arg(long, global = true, env = "DOTENV_PATH", default_value = ".env")]
    pub dotenv: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates the database and its tables if they do not exist yet.
    Init,

    /// Runs the web server.
    Serve {
        #[arg(short, long, help = "Address to listen on (overrides SDIARY_BIND_ADDR)")]
        bind: Option<String>,
    },

    /// Lists entries, newest first, with their share links.
    List {
        #[arg(short, long, help = "Show only the latest N entries")]
        num: Option<usize>,
    },

    /// Prints the share link of one entry.
    Link {
        #[arg(help = "The numeric ID of the entry")]
        id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_db_after_subcommand() {
        let cli = Cli::try_parse_from(["sdiary", "list", "--db", "/tmp/x.db", "-n", "3"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Commands::List { num: Some(3) }));
    }

    #[test]
    fn link_requires_numeric_id() {
        assert!(Cli::try_parse_from(["sdiary", "link", "abc"]).is_err());
        let cli = Cli::try_parse_from(["sdiary", "link", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Link { id: 7 }));
    }
}
