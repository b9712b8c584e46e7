//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// rayext - install extensions straight from their source repositories
#[derive(Parser, Debug)]
#[command(name = "rayext")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run (defaults to `list`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options accepted by every command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Extra attempts for each request to the repository host [default: 5]
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Access token for the repository host
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Extensions root directory [default: ~/.rayext]
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (otherwise rayext.toml/json/yaml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never prompt; take the default answer
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Skip the package install and develop build
    #[arg(long, global = true)]
    pub skip_build: bool,

    /// Monorepo sub-package path, relative to the repository root
    #[arg(long = "package", global = true, value_name = "PATH")]
    pub packages: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository host API base URL
    #[arg(long, global = true, env = "RAYEXT_API_BASE", hide = true)]
    pub api_base: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List installed extensions
    #[command(visible_alias = "ls")]
    List,

    /// Show details of installed extensions
    #[command(visible_aliases = ["v", "info", "show"])]
    View {
        /// Extensions to show: key, repository or title
        #[arg(required = true)]
        extensions: Vec<String>,
    },

    /// Install extensions from their repositories
    ///
    /// Examples:
    ///   rayext install owner/name            # newest tag, or default branch
    ///   rayext install owner/name@v1.2.0     # a specific tag
    ///   rayext install owner/name --branch dev
    #[command(visible_aliases = ["i", "add"])]
    Install {
        /// Repositories as `[@]owner/name[@tag]`
        #[arg(required = true)]
        extensions: Vec<String>,

        /// Branch to install when no tag is requested
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Remove installed extensions
    #[command(visible_aliases = ["un", "u", "remove", "rm"])]
    Uninstall {
        /// Extensions to remove: key, repository or title
        #[arg(required = true)]
        extensions: Vec<String>,
    },

    /// Update installed extensions (all of them when none is given)
    #[command(visible_aliases = ["upgrade", "up"])]
    Update {
        /// Extensions to update: key, repository or title
        extensions: Vec<String>,
    },
}

/// A positional `[@scope/]name[@version]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionArg {
    pub name: String,
    pub version: Option<String>,
}

impl ExtensionArg {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches('@');
        match trimmed.rsplit_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => Self {
                name: name.to_string(),
                version: Some(version.to_string()),
            },
            _ => Self {
                name: trimmed.trim_end_matches('@').to_string(),
                version: None,
            },
        }
    }
}
