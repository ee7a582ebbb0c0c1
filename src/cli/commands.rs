//! CLI command definitions using clap
//!
//! Defines the command structure for the `td` CLI tool.

use clap::{Parser, Subcommand, ValueEnum};

/// ticketdesk - Support Ticket Manager TUI
///
/// A terminal application for browsing and submitting support tickets.
/// Run without arguments to launch the TUI mode.
#[derive(Parser, Debug)]
#[command(name = "td", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tickets
    List {
        /// Full-text search over title and description
        #[arg(long)]
        search: Option<String>,

        /// Filter by category (billing, technical, account, general)
        #[arg(long)]
        category: Option<String>,

        /// Filter by priority (low, medium, high, critical)
        #[arg(long)]
        priority: Option<String>,

        /// Filter by status (open, in_progress, resolved, closed)
        #[arg(long)]
        status: Option<String>,
    },

    /// Submit a new ticket
    Create {
        /// Short summary of the issue
        #[arg(long, short)]
        title: String,

        /// Detailed description
        #[arg(long, short)]
        description: String,

        /// Ticket category; omit to classify automatically
        #[arg(long)]
        category: Option<String>,

        /// Ticket priority; omit to classify automatically
        #[arg(long)]
        priority: Option<String>,
    },

    /// Change the status of a ticket
    Update {
        /// Ticket id
        id: u64,

        /// New status (open, in_progress, resolved, closed)
        #[arg(long)]
        status: String,
    },

    /// Show aggregate ticket statistics
    Stats,

    /// Ask the classifier for a category/priority suggestion
    Classify {
        /// Description text to classify
        description: String,
    },

    /// Manage configuration
    Config(ConfigArgs),
}

/// Configuration commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
        /// New value
        value: String,
    },
    /// Show a configuration value
    Get {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
    },
}

/// Configuration keys
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ConfigKey {
    /// Base URL of the ticket REST API
    #[value(name = "api-url")]
    ApiUrl,
}
