//! Ticket API integration module
//!
//! This module provides all REST-related functionality:
//! - Wire types for tickets, filters, and stats
//! - The HTTP client over `/api/tickets`
//! - The classification ("AI suggestion") endpoint

pub mod client;
pub mod types;

pub use client::{TicketApi, TicketClient};
pub use types::{
    Category, ClassificationSuggestion, Priority, Status, Ticket, TicketDraft, TicketFilters,
    TicketPatch, TicketStats,
};
