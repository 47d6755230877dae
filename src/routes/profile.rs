use actix_web::{get, put, web, HttpResponse, Responder};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserProfile;
use crate::types::UpdateProfileRequest;
use crate::AppState;

#[get("/profile")]
async fn get_profile(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = UserProfile::get(&app_state.pool, &authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Error loading profile: {:?}", e);
            e
        })?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(HttpResponse::Ok().json(profile))
}

#[put("/profile")]
async fn update_profile(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    let profile = req_body
        .into_inner()
        .into_profile(&authenticated_user.user_id)?;

    let profile = UserProfile::upsert(&app_state.pool, &profile)
        .await
        .map_err(|e| {
            error!("Error saving profile: {:?}", e);
            e
        })?;

    info!("Profile updated for user {}", profile.id);
    Ok(HttpResponse::Ok().json(profile))
}
