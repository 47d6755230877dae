use actix_web::http::header::CONTENT_TYPE;
use actix_web::{get, post, put, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::analyzer;
use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ClothingItem;
use crate::storage::{content_type_for, object_key};
use crate::types::UploadClothingQuery;
use crate::AppState;

#[get("/clothes")]
async fn list_clothes(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let items = ClothingItem::list_for_user(
        &app_state.pool,
        &app_state.closet_cache,
        &authenticated_user.user_id,
    )
    .await
    .map_err(|e| {
        error!("Error loading clothes: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(items))
}

/// Stores the raw image body, tags it with the AI gateway and saves the item.
#[post("/clothes/upload")]
async fn upload_clothing(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    query: web::Query<UploadClothingQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    let category = query
        .category
        .ok_or_else(|| AppError::Validation("Missing category".to_string()))?;
    let filename = query
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing filename".to_string()))?;
    if body.is_empty() {
        return Err(AppError::Validation("Missing image data".to_string()));
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| value.starts_with("image/"))
        .unwrap_or_else(|| content_type_for(&filename));

    let user_id = authenticated_user.user_id;
    let now = Utc::now();
    let key = object_key(&user_id, &filename, now);
    app_state.storage.put(&key, body, content_type).await?;
    let image_url = app_state.storage.public_url(&key);

    let analysis = app_state
        .gateway
        .analyze_clothing(&image_url, category)
        .await
        .map_err(|e| {
            error!("Error analyzing clothing: {:?}", e);
            e
        })?;

    let item = ClothingItem {
        id: Uuid::new_v4(),
        user_id,
        image_url,
        category,
        subcategory: analysis.subcategory,
        color: analysis.color,
        material: analysis.material,
        seasons: analysis.season,
        tags: analysis.tags,
        ai_description: analysis.description,
        last_worn_at: None,
        created_at: now,
        updated_at: now,
    };
    let item = ClothingItem::create(&app_state.pool, &app_state.closet_cache, item)
        .await
        .map_err(|e| {
            error!("Error saving clothing item: {:?}", e);
            e
        })?;

    info!("Uploaded clothing item {} for user {}", item.id, item.user_id);
    Ok(HttpResponse::Created().json(item))
}

#[put("/clothes/{id}/worn")]
async fn mark_worn(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let item = ClothingItem::mark_worn(
        &app_state.pool,
        &app_state.closet_cache,
        &authenticated_user.user_id,
        path.into_inner(),
        Utc::now(),
    )
    .await
    .map_err(|e| {
        error!("Error marking item as worn: {:?}", e);
        e
    })?;

    Ok(HttpResponse::Ok().json(item))
}

#[get("/clothes/insights")]
async fn wardrobe_insights(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let items = ClothingItem::list_for_user(
        &app_state.pool,
        &app_state.closet_cache,
        &authenticated_user.user_id,
    )
    .await
    .map_err(|e| {
        error!("Error loading clothes for insights: {:?}", e);
        e
    })?;

    let analysis = analyzer::analyze(&items, Utc::now(), &app_state.analyzer);
    Ok(HttpResponse::Ok().json(analysis))
}
