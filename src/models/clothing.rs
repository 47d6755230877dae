use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use sqlx::{query_as, FromRow, PgPool, Type};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Per-user view of the catalog, newest item first.
///
/// Writes never patch a cached entry: they drop it, and a load that overlapped a
/// write is not stored.
#[derive(Clone)]
pub struct ClosetCache {
    catalogs: Cache<String, Vec<ClothingItem>>,
    writes: Arc<AtomicU64>,
}

impl ClosetCache {
    pub fn new(max_capacity: u64, time_to_live: Duration) -> Self {
        ClosetCache {
            catalogs: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(time_to_live)
                .build(),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, user_id: &str) -> Option<Vec<ClothingItem>> {
        self.catalogs.get(user_id).await
    }

    /// Write counter to read before loading a catalog from the database.
    pub fn generation(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stores a catalog loaded after [`ClosetCache::generation`] returned `generation`.
    /// Returns whether the catalog was kept.
    pub async fn store_loaded(
        &self,
        user_id: &str,
        items: Vec<ClothingItem>,
        generation: u64,
    ) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.catalogs.insert(user_id.to_string(), items).await;
        // A write may have invalidated between the check and the insert.
        if self.generation() != generation {
            self.catalogs.invalidate(user_id).await;
            return false;
        }
        true
    }

    /// Call after a committed write to the user's catalog.
    pub async fn invalidate_after_write(&self, user_id: &str) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.catalogs.invalidate(user_id).await;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "clothing_category", rename_all = "lowercase")] // SQL value name
#[serde(rename_all = "lowercase")] // JSON value name
pub enum Category {
    Top,
    Bottom,
    Dress,
    Outerwear,
    Footwear,
    Accessory,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Top => write!(f, "top"),
            Category::Bottom => write!(f, "bottom"),
            Category::Dress => write!(f, "dress"),
            Category::Outerwear => write!(f, "outerwear"),
            Category::Footwear => write!(f, "footwear"),
            Category::Accessory => write!(f, "accessory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ClothingItem {
    pub id: Uuid,
    pub user_id: String,
    pub image_url: String,
    pub category: Category,
    pub subcategory: String,
    pub color: String,
    pub material: String,
    pub seasons: Vec<String>,
    pub tags: Vec<String>,
    pub ai_description: String,
    pub last_worn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ClothingItem {
    fn default() -> Self {
        ClothingItem {
            id: Uuid::new_v4(),
            user_id: String::new(),
            image_url: String::new(),
            category: Category::Top,
            subcategory: String::new(),
            color: String::new(),
            material: String::new(),
            seasons: Vec::new(),
            tags: Vec::new(),
            ai_description: String::new(),
            last_worn_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl ClothingItem {
    /// Persists a freshly analyzed item and drops the user's cached catalog.
    pub async fn create(
        pool: &PgPool,
        cache: &ClosetCache,
        item: ClothingItem,
    ) -> Result<Self, AppError> {
        let item = query_as::<_, ClothingItem>(
            r#"
            INSERT INTO clothes (id, user_id, image_url, category, subcategory, color, material, seasons, tags, ai_description, last_worn_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(&item.user_id)
        .bind(&item.image_url)
        .bind(item.category)
        .bind(&item.subcategory)
        .bind(&item.color)
        .bind(&item.material)
        .bind(&item.seasons)
        .bind(&item.tags)
        .bind(&item.ai_description)
        .bind(item.last_worn_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::TransientIo(e.to_string()))?;

        cache.invalidate_after_write(&item.user_id).await;

        debug!("Clothing item created: {:?}", item.id);
        Ok(item)
    }

    /// Returns the user's catalog, newest first, from the cache when present.
    pub async fn list_for_user(
        pool: &PgPool,
        cache: &ClosetCache,
        user_id: &str,
    ) -> Result<Vec<Self>, AppError> {
        if let Some(items) = cache.get(user_id).await {
            debug!("Retrieved {} items from cache for user: {}", items.len(), user_id);
            return Ok(items);
        }

        let generation = cache.generation();
        let items = query_as::<_, ClothingItem>(
            r#"
            SELECT * FROM clothes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::TransientIo(e.to_string()))?;

        cache.store_loaded(user_id, items.clone(), generation).await;
        info!("Loaded {} clothing items for user: {}", items.len(), user_id);
        Ok(items)
    }

    /// Sets `last_worn_at` for one item owned by `user_id`.
    pub async fn mark_worn(
        pool: &PgPool,
        cache: &ClosetCache,
        user_id: &str,
        item_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let item = query_as::<_, ClothingItem>(
            r#"
            UPDATE clothes
            SET last_worn_at = $1, updated_at = $1
            WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::TransientIo(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Clothing item {} not found", item_id)))?;

        cache.invalidate_after_write(user_id).await;

        info!("Item {} marked as worn by user {}", item_id, user_id);
        Ok(item)
    }
}
