use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use taplog_core::Category;

#[derive(Parser)]
#[command(name = "taplog")]
#[command(about = "Tap to log what you eat, drink, feel, and how you sit")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the local cache file
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_path: Option<PathBuf>,

    /// CLI profile name for Supabase configuration and session
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a tap for a category (eat, drink, feel, posture)
    Tap {
        /// Category to tap
        category: Category,
        /// Replace the checkmark with this note
        #[arg(long)]
        note: Option<String>,
    },
    /// Record a free-standing note
    Note {
        /// Note text (empty when omitted)
        text: Vec<String>,
    },
    /// List recent entries grouped by day
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry
    Delete {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Replace the local log with the latest cloud copy
    Sync,
    /// Export the log as CSV
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Single-key logging session
    #[command(alias = "i")]
    Interactive,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in with an email magic link
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Where the magic link redirects after sign-in
        #[arg(long, value_name = "URL")]
        redirect_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Email a magic link / one-time code
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Finish sign-in with the emailed code or the magic link URL
    Verify {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email (required with --code)
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,
        /// One-time code from the email
        #[arg(long, value_name = "CODE", conflicts_with = "link")]
        code: Option<String>,
        /// Full URL the magic link redirected to
        #[arg(long, value_name = "URL")]
        link: Option<String>,
    },
    /// Show auth status for profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Logout profile and clear stored session
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
