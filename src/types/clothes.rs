use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, ClothingItem};

#[derive(Deserialize, ToSchema)]
pub struct UploadClothingQuery {
    pub category: Option<Category>,
    pub filename: Option<String>,
}

/// Structured tags returned by the image analysis service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClothingAnalysis {
    pub description: String,
    pub color: String,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub material: String,
    pub season: Vec<String>,
}

/// Compact item view embedded in AI prompts.
#[derive(Serialize)]
pub struct PromptItem<'a> {
    pub id: Uuid,
    pub category: Category,
    pub subcategory: &'a str,
    pub color: &'a str,
    pub description: &'a str,
    pub tags: &'a [String],
    pub season: &'a [String],
}

impl<'a> From<&'a ClothingItem> for PromptItem<'a> {
    fn from(item: &'a ClothingItem) -> Self {
        PromptItem {
            id: item.id,
            category: item.category,
            subcategory: &item.subcategory,
            color: &item.color,
            description: &item.ai_description,
            tags: &item.tags,
            season: &item.seasons,
        }
    }
}

pub fn prompt_catalog(items: &[ClothingItem]) -> String {
    let list: Vec<PromptItem> = items.iter().map(PromptItem::from).collect();
    serde_json::to_string_pretty(&list).unwrap_or_else(|_| "[]".to_string())
}
