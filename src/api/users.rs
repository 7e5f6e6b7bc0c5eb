use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::api::{load_user, require_text};
use crate::auth::CurrentActor;
use crate::db::{UserChanges, UserPublic};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub password: Option<String>,
}

pub async fn list_users(
    CurrentActor(actor): CurrentActor,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth.policy().require_agent(&actor)?;

    let users: Vec<UserPublic> = state
        .db
        .list_users()
        .await?
        .into_iter()
        .map(UserPublic::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    CurrentActor(actor): CurrentActor,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = load_user(&state.db, path.into_inner()).await?;
    state.auth.policy().can_view_user(&actor, user.id)?;
    Ok(HttpResponse::Ok().json(UserPublic::from(user)))
}

pub async fn update_user(
    CurrentActor(actor): CurrentActor,
    path: web::Path<i64>,
    req: web::Json<UpdateUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = load_user(&state.db, path.into_inner()).await?;
    state.auth.policy().can_update_user(&actor, user.id)?;

    let req = req.into_inner();
    let hashed_password = match req.password.as_deref() {
        Some(password) => Some(state.auth.hash_password(password).await?),
        None => None,
    };
    let changes = UserChanges {
        full_name: req
            .full_name
            .as_deref()
            .map(|name| require_text(name, "full_name"))
            .transpose()?,
        hashed_password,
    };

    let updated = state.db.update_user(user.id, &changes).await?;
    info!("User {} updated by user {}", updated.id, actor.id());
    Ok(HttpResponse::Ok().json(UserPublic::from(updated)))
}
