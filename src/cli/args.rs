//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::storage::SubscriptionTier;

/// thryve - AI voice health check-ins and reports
#[derive(Parser, Debug)]
#[command(name = "thryve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Profile to act as (defaults to general.user_id)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage your profile and phone number
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Place and follow a health-check call
    #[command(subcommand)]
    Call(CallCommand),

    /// Browse reports from completed calls
    #[command(subcommand)]
    Report(ReportCommand),

    /// Ask the health assistant a question
    Chat {
        /// Message to send (omit to show the conversation so far)
        message: Option<String>,

        /// Delete the conversation history
        #[arg(long)]
        clear: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Create or update your profile
    Set {
        /// Phone number without the country code
        #[arg(short, long)]
        phone: Option<String>,

        /// Country dialing code
        #[arg(short, long, default_value = "+91")]
        country_code: String,

        /// Display name (the first word is used to greet you)
        #[arg(short, long)]
        name: Option<String>,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show your profile
    Show,

    /// Change your subscription plan
    Plan {
        /// Plan to switch to
        #[arg(value_enum)]
        tier: SubscriptionTier,
    },
}

#[derive(Subcommand, Debug)]
pub enum CallCommand {
    /// Start a health-check call to your phone
    Start {
        /// Return right after the call is placed
        #[arg(long)]
        no_wait: bool,
    },

    /// Check the call in progress once
    Status,

    /// Follow the call in progress until its report is ready
    Watch,

    /// Clear the current call so a new one can be started
    Reset {
        /// Abandon a call that is still in progress
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// List past reports
    List {
        /// Maximum number of reports to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a report
    View {
        /// Report ID or partial ID
        id: String,
    },

    /// Export a report to a file
    Export {
        /// Report ID or partial ID
        id: String,

        /// Output format (txt, json, md)
        #[arg(short, long, default_value = "txt")]
        format: String,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
