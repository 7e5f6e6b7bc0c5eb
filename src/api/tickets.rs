use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::api::{load_ticket, load_user, require_text};
use crate::auth::CurrentActor;
use crate::db::{NewTicket, TicketChanges, TicketFilter};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the caller.
    pub creator_id: Option<i64>,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
}

pub async fn create_ticket(
    CurrentActor(actor): CurrentActor,
    req: web::Json<CreateTicketRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let title = require_text(&req.title, "title")?;
    let creator_id = req.creator_id.unwrap_or_else(|| actor.id());

    // Ownership is checked before existence so naming someone else is always forbidden.
    state.auth.policy().can_create_ticket(&actor, creator_id)?;
    load_user(&state.db, creator_id).await?;
    if let Some(assignee_id) = req.assignee_id {
        load_user(&state.db, assignee_id).await?;
    }

    let ticket = state
        .db
        .create_ticket(&NewTicket {
            title,
            description: req.description,
            creator_id,
            assignee_id: req.assignee_id,
        })
        .await?;

    info!("Ticket {} created by user {}", ticket.id, actor.id());
    Ok(HttpResponse::Created().json(ticket))
}

pub async fn list_tickets(
    CurrentActor(actor): CurrentActor,
    query: web::Query<TicketQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let filter = TicketFilter {
        status: query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        creator_id: state.auth.policy().ticket_scope(&actor),
    };

    let tickets = state.db.list_tickets(&filter).await?;
    Ok(HttpResponse::Ok().json(tickets))
}

pub async fn get_ticket(
    CurrentActor(actor): CurrentActor,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ticket = load_ticket(&state.db, path.into_inner()).await?;
    state.auth.policy().can_view_ticket(&actor, &ticket)?;
    Ok(HttpResponse::Ok().json(ticket))
}

pub async fn update_ticket(
    CurrentActor(actor): CurrentActor,
    path: web::Path<i64>,
    changes: web::Json<TicketChanges>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ticket = load_ticket(&state.db, path.into_inner()).await?;
    let mut changes = changes.into_inner();
    state
        .auth
        .policy()
        .can_update_ticket(&actor, &ticket, &changes)?;

    if let Some(title) = &changes.title {
        changes.title = Some(require_text(title, "title")?);
    }
    if let Some(status) = &changes.status {
        changes.status = Some(require_text(status, "status")?);
    }
    if let Some(assignee_id) = changes.assignee_id {
        load_user(&state.db, assignee_id).await?;
    }

    let updated = state.db.update_ticket(ticket.id, &changes).await?;
    info!(
        "Ticket {} updated by user {} (status: {})",
        updated.id,
        actor.id(),
        updated.status
    );
    Ok(HttpResponse::Ok().json(updated))
}
