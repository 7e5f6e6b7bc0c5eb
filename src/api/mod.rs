//! Resource handlers for tickets, messages and users.

pub mod messages;
pub mod tickets;
pub mod users;

use crate::db::{DbOperations, Ticket, User};
use crate::error::AppError;

pub(crate) async fn load_ticket(db: &DbOperations, id: i64) -> Result<Ticket, AppError> {
    db.get_ticket_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket not found"))
}

pub(crate) async fn load_user(db: &DbOperations, id: i64) -> Result<User, AppError> {
    db.get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Trims `value` and rejects it if nothing is left.
pub(crate) fn require_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
