use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use crate::auth::extractor::CurrentActor;
use crate::auth::service::Registration;
use crate::db::UserPublic;
use crate::error::AppError;
use crate::AppState;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_agent: bool,
}

/// OAuth2 password-grant style form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(alias = "email")]
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub access_token: String,
    pub token_type: String,
    pub user_id: i64,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email);
    let req = req.into_inner();

    let (user, created) = state
        .auth
        .register(Registration {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            is_agent: req.is_agent,
        })
        .await
        .map_err(|e| {
            warn!("Registration failed: {}", e);
            e
        })?;

    let token = state.auth.issue_token(&user)?;
    let body = AuthResponse {
        message: Some(if created { "registered" } else { "already_registered" }.to_string()),
        access_token: token.access_token,
        token_type: token.token_type.to_string(),
        user_id: user.id,
    };

    if created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

pub async fn login(
    form: web::Form<LoginForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", form.username);
    match state
        .auth
        .authenticate(&form.username, form.password.as_deref())
        .await
    {
        Ok(user) => {
            let token = state.auth.issue_token(&user)?;
            info!("Login successful for user {}", user.id);
            Ok(HttpResponse::Ok().json(AuthResponse {
                message: None,
                access_token: token.access_token,
                token_type: token.token_type.to_string(),
                user_id: user.id,
            }))
        }
        Err(e) => {
            warn!("Login failed for email: {}: {}", form.username, e);
            Err(e)
        }
    }
}

pub async fn me(
    CurrentActor(actor): CurrentActor,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if !state.auth.auth_required() {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "id": null,
            "email": null,
            "is_agent": false,
            "note": "authentication disabled; anonymous access"
        })));
    }

    let user = state
        .db
        .get_user_by_id(actor.id())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(UserPublic::from(user)))
}
