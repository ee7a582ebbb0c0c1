//! CLI module for ticketdesk
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod commands;
pub mod config;
pub mod tickets;

pub use commands::{Cli, Commands};
