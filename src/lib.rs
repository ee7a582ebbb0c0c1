//! ticketdesk - A TUI application for managing support tickets
//!
//! This library provides both CLI and TUI interfaces for a support-ticket
//! REST API, including ticket submission with AI-assisted classification,
//! a filterable ticket list, and an aggregate stats dashboard.

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod tui;

pub use error::{Result, TicketError};
