//! Core functionality for ticketdesk
//!
//! This module contains shared business logic including:
//! - Application configuration

pub mod config;

pub use config::Config;
