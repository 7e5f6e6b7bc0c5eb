use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::policy::Actor;
use crate::error::AppError;
use crate::AppState;

/// Extracts the calling actor for a handler.
///
/// With auth required this rejects the request with 401 unless it carries a
/// valid bearer token for an active user. With auth disabled it always yields
/// the anonymous actor.
pub struct CurrentActor(pub Actor);

impl FromRequest for CurrentActor {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| AppError::InternalError("Application state not configured".into()))?;
            let actor = state.auth.resolve_actor(authorization.as_deref()).await?;
            Ok(CurrentActor(actor))
        })
    }
}
