use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::api::{load_ticket, load_user, require_text};
use crate::auth::CurrentActor;
use crate::db::NewMessage;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub ticket_id: i64,
    /// Defaults to the caller.
    pub author_id: Option<i64>,
    pub content: String,
}

pub async fn post_message(
    CurrentActor(actor): CurrentActor,
    req: web::Json<CreateMessageRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let content = require_text(&req.content, "content")?;

    let ticket = load_ticket(&state.db, req.ticket_id).await?;
    let author_id = req.author_id.unwrap_or_else(|| actor.id());
    state
        .auth
        .policy()
        .can_post_message(&actor, &ticket, author_id)?;
    load_user(&state.db, author_id).await?;

    let message = state
        .db
        .create_message(&NewMessage {
            ticket_id: ticket.id,
            author_id,
            content,
        })
        .await?;

    info!("Message {} posted to ticket {}", message.id, ticket.id);
    Ok(HttpResponse::Created().json(message))
}

pub async fn list_messages(
    CurrentActor(actor): CurrentActor,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let ticket = load_ticket(&state.db, path.into_inner()).await?;
    state.auth.policy().can_list_messages(&actor, &ticket)?;

    let messages = state.db.list_messages_for_ticket(ticket.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}
