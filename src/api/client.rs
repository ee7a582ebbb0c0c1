//! Ticket REST API client
//!
//! Thin wrapper over the `/api/tickets` endpoints. Every operation is a
//! single request with no retries; failures surface to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::types::{
    ClassificationSuggestion, Ticket, TicketDraft, TicketFilters, TicketPatch, TicketStats,
};
use crate::core::config::Config;
use crate::error::{Result, TicketError};

/// The ticket API surface
///
/// A trait seam so the TUI coordinator can be exercised against a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketApi: Send + Sync {
    /// List tickets matching the given filters
    async fn list_tickets(&self, filters: TicketFilters) -> Result<Vec<Ticket>>;

    /// Submit a new ticket
    async fn create_ticket(&self, draft: TicketDraft) -> Result<Ticket>;

    /// Apply a partial update to a ticket
    async fn update_ticket(&self, id: u64, patch: TicketPatch) -> Result<Ticket>;

    /// Fetch aggregate statistics
    async fn fetch_stats(&self) -> Result<TicketStats>;

    /// Request a category/priority suggestion for a description
    async fn classify(&self, description: String) -> Result<ClassificationSuggestion>;
}

/// HTTP implementation of [`TicketApi`]
pub struct TicketClient {
    http: Client,
    base: Url,
}

/// List responses are either a bare array or a DRF pagination envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TicketListResponse {
    Plain(Vec<Ticket>),
    Paginated { results: Vec<Ticket> },
}

impl TicketListResponse {
    fn into_tickets(self) -> Vec<Ticket> {
        match self {
            TicketListResponse::Plain(tickets) => tickets,
            TicketListResponse::Paginated { results } => results,
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest {
    description: String,
}

impl TicketClient {
    /// Create a client for the given API base URL
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    /// Create a client from the saved configuration
    pub fn from_config() -> Result<Self> {
        let config = Config::load()?;
        let base = Url::parse(&config.api_base_url)
            .map_err(|e| TicketError::Config(format!("invalid API base URL: {}", e)))?;
        Ok(Self::new(base))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| TicketError::Config(format!("invalid API endpoint: {}", e)))
    }
}

#[async_trait]
impl TicketApi for TicketClient {
    async fn list_tickets(&self, filters: TicketFilters) -> Result<Vec<Ticket>> {
        let url = self.endpoint("api/tickets/")?;
        let response = self
            .http
            .get(url)
            .query(&filters.to_query())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TicketError::Network(format!(
                "ticket list returned {}",
                response.status()
            )));
        }

        let body: TicketListResponse = response.json().await?;
        Ok(body.into_tickets())
    }

    async fn create_ticket(&self, draft: TicketDraft) -> Result<Ticket> {
        let url = self.endpoint("api/tickets/")?;
        let response = self.http.post(url).json(&draft).send().await?;

        if !response.status().is_success() {
            // The server answers with a JSON error payload describing which
            // fields were rejected; surface it verbatim.
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("ticket creation returned {}", status)
            } else {
                body
            };
            return Err(TicketError::Validation(message));
        }

        Ok(response.json().await?)
    }

    async fn update_ticket(&self, id: u64, patch: TicketPatch) -> Result<Ticket> {
        let url = self.endpoint(&format!("api/tickets/{}/", id))?;
        let response = self.http.patch(url).json(&patch).send().await?;

        if !response.status().is_success() {
            return Err(TicketError::Network(format!(
                "ticket update returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_stats(&self) -> Result<TicketStats> {
        let url = self.endpoint("api/tickets/stats/")?;
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TicketError::Network(format!(
                "stats returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn classify(&self, description: String) -> Result<ClassificationSuggestion> {
        let url = self.endpoint("api/tickets/classify/")?;
        let response = self
            .http
            .post(url)
            .json(&ClassifyRequest { description })
            .send()
            .await
            .map_err(|e| TicketError::Classification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TicketError::Classification(format!(
                "classify returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TicketError::Classification(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_accepts_bare_array() {
        let json = r#"[{
            "id": 1,
            "title": "Printer on fire",
            "description": "Smoke everywhere",
            "category": "technical",
            "priority": "critical",
            "status": "open",
            "created_at": "2026-08-30T12:00:00Z"
        }]"#;
        let parsed: TicketListResponse = serde_json::from_str(json).unwrap();
        let tickets = parsed.into_tickets();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, 1);
    }

    #[test]
    fn test_list_response_accepts_results_envelope() {
        let json = r#"{"count": 0, "results": []}"#;
        let parsed: TicketListResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_tickets().is_empty());
    }

    #[test]
    fn test_endpoints_resolve_against_base() {
        let client = TicketClient::new(Url::parse("http://localhost:8000").unwrap());
        assert_eq!(
            client.endpoint("api/tickets/42/").unwrap().as_str(),
            "http://localhost:8000/api/tickets/42/"
        );
        assert_eq!(
            client.endpoint("api/tickets/stats/").unwrap().as_str(),
            "http://localhost:8000/api/tickets/stats/"
        );
    }
}
