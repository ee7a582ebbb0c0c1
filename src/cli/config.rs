//! Configuration CLI command handlers

use url::Url;

use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::Config;
use crate::error::{Result, TicketError};

/// Handle configuration commands
pub fn handle_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Set { key, value } => handle_set(key, value),
        ConfigCommand::Get { key } => handle_get(key),
    }
}

/// Handle setting a configuration value
fn handle_set(key: ConfigKey, value: String) -> Result<()> {
    match key {
        ConfigKey::ApiUrl => {
            Url::parse(&value)
                .map_err(|e| TicketError::InvalidInput(format!("Invalid URL '{}': {}", value, e)))?;

            let mut config = Config::load()?;
            config.api_base_url = value;
            config.save()?;

            println!("API base URL set to: {}", config.api_base_url);
        }
    }
    Ok(())
}

/// Handle getting a configuration value
fn handle_get(key: ConfigKey) -> Result<()> {
    match key {
        ConfigKey::ApiUrl => {
            let config = Config::load()?;
            println!("API base URL: {}", config.api_base_url);
        }
    }
    Ok(())
}
