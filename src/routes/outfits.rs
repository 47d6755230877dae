use actix_web::{post, web, HttpResponse, Responder};
use std::sync::Arc;
use tracing::error;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ClothingItem, UserProfile};
use crate::types::RecommendOutfitsRequest;
use crate::AppState;

#[post("/outfits/recommend")]
async fn recommend_outfits(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<RecommendOutfitsRequest>,
) -> Result<impl Responder, AppError> {
    let occasion = req_body.occasion.trim();
    let weather = req_body.weather.trim();
    if occasion.is_empty() || weather.is_empty() {
        return Err(AppError::Validation(
            "Occasion and weather are required".to_string(),
        ));
    }

    let user_id = &authenticated_user.user_id;
    let items = ClothingItem::list_for_user(&app_state.pool, &app_state.closet_cache, user_id)
        .await
        .map_err(|e| {
            error!("Error loading clothes for recommendations: {:?}", e);
            e
        })?;

    let profile = if items.is_empty() {
        None
    } else {
        UserProfile::get(&app_state.pool, user_id).await?
    };

    let response = app_state
        .gateway
        .recommend_outfits(profile.as_ref(), &items, occasion, weather)
        .await
        .map_err(|e| {
            error!("Error recommending outfits: {:?}", e);
            e
        })?
        .with_empty_notice();

    Ok(HttpResponse::Ok().json(response))
}
