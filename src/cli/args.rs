use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Backend;
use crate::version::VERSION;

#[derive(Parser, Debug)]
#[command(version = VERSION, about, long_about = None)]
pub struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "MEMORY_BOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store to use, overriding the settings file
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a command
    ///
    /// Passwords, tokens and URL credentials are masked before saving.
    /// Example:
    ///   memory-box add -d "Show listening ports" -t net -- ss -tlnp
    Add {
        /// What the command does
        #[arg(short, long)]
        description: String,

        /// Tags to add to the command
        #[arg(short, long)]
        tags: Vec<String>,

        /// Operating system the command is for
        #[arg(long)]
        os: Option<String>,

        /// Kind of project the command applies to (e.g. rust, node)
        #[arg(long)]
        project_type: Option<String>,

        /// Free-text notes on when to use it
        #[arg(long)]
        context: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Command to add
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Search saved commands
    Search {
        /// Text to look for in command, description or context
        query: Option<String>,

        #[arg(long)]
        os: Option<String>,

        #[arg(long)]
        project_type: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Only commands carrying all of these tags
        #[arg(short, long)]
        tags: Vec<String>,

        /// Maximum number of results to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Rank by approximate similarity instead of exact substring
        #[arg(short, long)]
        fuzzy: bool,

        /// Minimum fuzzy score, 0-100
        #[arg(long, requires = "fuzzy")]
        threshold: Option<f64>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a command by id and count the use
    Get {
        id: String,

        /// Print the command as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a command by id
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List all tags
    Tags,

    /// List all categories
    Categories,
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse().map_err(|e: crate::error::Error| e.to_string())
}
