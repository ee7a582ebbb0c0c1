//! ticketdesk - Support Ticket Manager TUI
//!
//! A terminal application for browsing and submitting support tickets.
//! Run without arguments to launch the TUI, or use subcommands for CLI mode.
//!
//! Available as the `td` command.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ticketdesk::api::TicketClient;
use ticketdesk::cli::commands::{Cli, Commands};
use ticketdesk::cli::{config, tickets};
use ticketdesk::error::Result;
use ticketdesk::tui::App;

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // No subcommand - launch TUI mode
        None => run_tui().await,

        // Config commands don't touch the network
        Some(Commands::Config(args)) => config::handle_config(args.command),

        Some(Commands::List {
            search,
            category,
            priority,
            status,
        }) => tickets::handle_list(search, category, priority, status).await,

        Some(Commands::Create {
            title,
            description,
            category,
            priority,
        }) => tickets::handle_create(title, description, category, priority).await,

        Some(Commands::Update { id, status }) => tickets::handle_update(id, status).await,

        Some(Commands::Stats) => tickets::handle_stats().await,

        Some(Commands::Classify { description }) => tickets::handle_classify(description).await,
    }
}

/// Run the TUI application
async fn run_tui() -> Result<()> {
    let client = TicketClient::from_config()?;

    let mut app = App::new(Arc::new(client));
    app.run().await
}
