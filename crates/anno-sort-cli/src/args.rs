use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "anno-sort")]
#[command(about = "Group CSV rows by brain-region annotation")]
#[command(version)]
pub struct Cli {
    /// Verbose output (debug logs, per-group listing)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Base directory holding config.toml (default: ~/.anno-sort)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Options shared by `run` and `file`; unset flags fall back to config.toml
#[derive(Args, Clone, Debug, Default)]
pub struct SortArgs {
    /// Order groups alphabetically within each category
    #[arg(short, long)]
    pub alpha: bool,

    /// Order groups by first appearance within each category
    #[arg(long, conflicts_with = "alpha")]
    pub first_seen: bool,

    /// Input text encoding (e.g. utf-8-sig, gbk, windows-1252)
    #[arg(short, long, value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Maximum number of group spill files kept open at once
    #[arg(long, value_name = "N")]
    pub max_open: Option<usize>,

    /// Directory for temporary spill files
    #[arg(long, value_name = "DIR")]
    pub spill_dir: Option<PathBuf>,

    /// Suffix appended to the input file stem for the output
    #[arg(long, value_name = "SUFFIX")]
    pub suffix: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sort every CSV file in a directory (default command)
    Run {
        /// Directory to scan (default: config target_directory, else current directory)
        dir: Option<PathBuf>,

        #[command(flatten)]
        sort: SortArgs,
    },

    /// Sort a single CSV file
    File {
        /// Input CSV file
        input: PathBuf,

        /// Output path (default: <stem><suffix>.<ext> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        sort: SortArgs,
    },

    /// Show the category assigned to each label
    Classify {
        /// Labels to classify (e.g. VISp CA1 RT)
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Print the category rule tables in check order
    Rules,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., sort.input_encoding)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., sort.input_encoding)
        key: String,

        /// Value to set (e.g., "gbk"); an empty string clears optional paths
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Create config file with commented defaults
    Init,
}
