use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tasksync_core::{ConflictStrategy, SyncDirection};

#[derive(Parser)]
#[command(name = "tasksync")]
#[command(about = "Synchronize tasks between a local store and a hosted store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the contexts file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding sync-state.json and sync-conflicts.json
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Name of the local storage context
    #[arg(long, global = true, value_name = "NAME")]
    pub local: Option<String>,

    /// Name of the remote storage context
    #[arg(long, global = true, value_name = "NAME")]
    pub remote: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull the remote context into the local one
    Pull(SyncArgs),
    /// Push the local context into the remote one
    Push(SyncArgs),
    /// Show recorded sync times
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the recorded sync time for one context pair
    Reset {
        /// Source context name
        source: String,
        /// Target context name
        target: String,
        /// Direction of the recorded run
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// List recorded sync conflicts, newest first
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct SyncArgs {
    /// Fetch and compare without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Ignore the last recorded sync time
    #[arg(long = "full")]
    pub full: bool,
    /// Which side wins when both changed
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    RemoteWins,
    LocalWins,
}

impl From<StrategyArg> for ConflictStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::RemoteWins => Self::RemoteWins,
            StrategyArg::LocalWins => Self::LocalWins,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DirectionArg {
    Pull,
    Push,
}

impl From<DirectionArg> for SyncDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Pull => Self::Pull,
            DirectionArg::Push => Self::Push,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
