//! Ticket CLI command handlers

use crate::api::{
    Category, Priority, Status, TicketApi, TicketClient, TicketDraft, TicketFilters, TicketPatch,
};
use crate::error::{Result, TicketError};

/// Handle `td list`
pub async fn handle_list(
    search: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let filters = TicketFilters {
        search,
        category: parse_category(category)?,
        priority: parse_priority(priority)?,
        status: parse_status(status)?,
    };

    let client = TicketClient::from_config()?;
    let tickets = client.list_tickets(filters).await?;

    if tickets.is_empty() {
        println!("No tickets found.");
        return Ok(());
    }

    println!("Tickets ({}):\n", tickets.len());
    for ticket in tickets {
        println!(
            "#{} [{}/{}/{}] {}",
            ticket.id,
            ticket.category,
            ticket.priority,
            ticket.status,
            ticket.title
        );
    }

    Ok(())
}

/// Handle `td create`
///
/// If category or priority is omitted, the classifier fills the gap; an
/// explicitly passed value is never overridden.
pub async fn handle_create(
    title: String,
    description: String,
    category: Option<String>,
    priority: Option<String>,
) -> Result<()> {
    let mut category = parse_category(category)?;
    let mut priority = parse_priority(priority)?;

    let client = TicketClient::from_config()?;

    if category.is_none() || priority.is_none() {
        match client.classify(description.clone()).await {
            Ok(suggestion) => {
                println!(
                    "Classifier suggests: {} / {}",
                    suggestion.suggested_category, suggestion.suggested_priority
                );
                category = category.or(Some(suggestion.suggested_category));
                priority = priority.or(Some(suggestion.suggested_priority));
            }
            Err(e) => {
                tracing::debug!(error = %e, "classification failed");
            }
        }
    }

    let (Some(category), Some(priority)) = (category, priority) else {
        return Err(TicketError::InvalidInput(
            "Please select a category and priority\n\n  → Pass --category and --priority explicitly.".to_string(),
        ));
    };

    let ticket = client
        .create_ticket(TicketDraft {
            title,
            description,
            category,
            priority,
        })
        .await?;

    println!("Created ticket #{}: {}", ticket.id, ticket.title);
    Ok(())
}

/// Handle `td update`
pub async fn handle_update(id: u64, status: String) -> Result<()> {
    let status = Status::from_str(&status).ok_or_else(|| invalid_enum("status", &status))?;

    let client = TicketClient::from_config()?;
    let ticket = client.update_ticket(id, TicketPatch::status(status)).await?;

    println!(
        "Ticket #{} is now {}",
        ticket.id,
        ticket.status.display_name()
    );
    Ok(())
}

/// Handle `td stats`
pub async fn handle_stats() -> Result<()> {
    let client = TicketClient::from_config()?;
    let stats = client.fetch_stats().await?;

    println!("Total tickets:   {}", stats.total_tickets);
    println!("Open tickets:    {}", stats.open_tickets);
    println!("Avg per day:     {:.1}", stats.avg_tickets_per_day);

    println!("\nBy priority:");
    for priority in Priority::all() {
        if let Some(count) = stats.priority_breakdown.get(priority) {
            println!("  {:<12} {}", priority.display_name(), count);
        }
    }

    println!("\nBy category:");
    for category in Category::all() {
        if let Some(count) = stats.category_breakdown.get(category) {
            println!("  {:<12} {}", category.display_name(), count);
        }
    }

    Ok(())
}

/// Handle `td classify`
pub async fn handle_classify(description: String) -> Result<()> {
    let client = TicketClient::from_config()?;
    let suggestion = client.classify(description).await?;

    println!("Suggested category: {}", suggestion.suggested_category);
    println!("Suggested priority: {}", suggestion.suggested_priority);
    Ok(())
}

fn invalid_enum(field: &str, value: &str) -> TicketError {
    TicketError::InvalidInput(format!("Invalid {} '{}'", field, value))
}

fn parse_category(value: Option<String>) -> Result<Option<Category>> {
    value
        .map(|v| Category::from_str(&v).ok_or_else(|| invalid_enum("category", &v)))
        .transpose()
}

fn parse_priority(value: Option<String>) -> Result<Option<Priority>> {
    value
        .map(|v| Priority::from_str(&v).ok_or_else(|| invalid_enum("priority", &v)))
        .transpose()
}

fn parse_status(value: Option<String>) -> Result<Option<Status>> {
    value
        .map(|v| Status::from_str(&v).ok_or_else(|| invalid_enum("status", &v)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_accepts_wire_names() {
        assert_eq!(
            parse_category(Some("billing".to_string())).unwrap(),
            Some(Category::Billing)
        );
        assert_eq!(parse_category(None).unwrap(), None);
    }

    #[test]
    fn test_parse_status_rejects_unknown_values() {
        assert!(parse_status(Some("reopened".to_string())).is_err());
    }
}
