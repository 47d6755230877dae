use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::{query_as, FromRow, PgPool, Type};
use std::fmt;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "body_type_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Athletic,
    Slim,
    Curvy,
    PlusSize,
    Petite,
    Tall,
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyType::Athletic => write!(f, "athletic"),
            BodyType::Slim => write!(f, "slim"),
            BodyType::Curvy => write!(f, "curvy"),
            BodyType::PlusSize => write!(f, "plus_size"),
            BodyType::Petite => write!(f, "petite"),
            BodyType::Tall => write!(f, "tall"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "aesthetic_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Aesthetic {
    Minimalist,
    Bohemian,
    Streetwear,
    Classic,
    Romantic,
    Edgy,
    Preppy,
    Casual,
}

impl fmt::Display for Aesthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aesthetic::Minimalist => write!(f, "minimalist"),
            Aesthetic::Bohemian => write!(f, "bohemian"),
            Aesthetic::Streetwear => write!(f, "streetwear"),
            Aesthetic::Classic => write!(f, "classic"),
            Aesthetic::Romantic => write!(f, "romantic"),
            Aesthetic::Edgy => write!(f, "edgy"),
            Aesthetic::Preppy => write!(f, "preppy"),
            Aesthetic::Casual => write!(f, "casual"),
        }
    }
}

// Needed so `Vec<Aesthetic>` binds as `aesthetic_enum[]`
impl PgHasArrayType for Aesthetic {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_aesthetic_enum")
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub height_cm: Option<i32>,
    pub body_type: Option<BodyType>,
    pub aesthetics: Vec<Aesthetic>,
    pub color_preferences: Vec<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            id: String::new(),
            height_cm: None,
            body_type: None,
            aesthetics: Vec::new(),
            color_preferences: Vec::new(),
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

impl UserProfile {
    pub async fn get(pool: &PgPool, user_id: &str) -> Result<Option<Self>, AppError> {
        let profile = query_as::<_, UserProfile>("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::TransientIo(e.to_string()))?;

        Ok(profile)
    }

    /// Inserts the profile on first onboarding, otherwise replaces the editable fields.
    pub async fn upsert(pool: &PgPool, profile: &UserProfile) -> Result<Self, AppError> {
        let profile = query_as::<_, UserProfile>(
            r#"
            INSERT INTO profiles (id, height_cm, body_type, aesthetics, color_preferences, location, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET height_cm = EXCLUDED.height_cm,
                body_type = EXCLUDED.body_type,
                aesthetics = EXCLUDED.aesthetics,
                color_preferences = EXCLUDED.color_preferences,
                location = EXCLUDED.location,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(&profile.id)
        .bind(profile.height_cm)
        .bind(profile.body_type)
        .bind(&profile.aesthetics)
        .bind(&profile.color_preferences)
        .bind(&profile.location)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::TransientIo(e.to_string()))?;

        debug!("Profile saved: {:?}", profile.id);
        Ok(profile)
    }

    /// One-line summary used in AI prompts.
    pub fn describe(&self) -> String {
        let height = self
            .height_cm
            .map(|h| format!("{} cm", h))
            .unwrap_or_else(|| "not specified".to_string());
        let body_type = self
            .body_type
            .map(|b| b.to_string())
            .unwrap_or_else(|| "not specified".to_string());
        let aesthetics = join_or_unspecified(self.aesthetics.iter().map(|a| a.to_string()));
        let colors = join_or_unspecified(self.color_preferences.iter().cloned());

        format!(
            "Height: {}, Body type: {}, Aesthetics: {}, Color preferences: {}",
            height, body_type, aesthetics, colors
        )
    }
}

fn join_or_unspecified(values: impl Iterator<Item = String>) -> String {
    let joined = values.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "not specified".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_lists_preferences() {
        let profile = UserProfile {
            id: "user_1".into(),
            height_cm: Some(170),
            body_type: Some(BodyType::PlusSize),
            aesthetics: vec![Aesthetic::Classic, Aesthetic::Edgy],
            color_preferences: vec!["navy".into(), "olive".into()],
            ..Default::default()
        };

        assert_eq!(
            profile.describe(),
            "Height: 170 cm, Body type: plus_size, Aesthetics: classic, edgy, Color preferences: navy, olive"
        );
    }

    #[test]
    fn describe_empty_profile() {
        let description = UserProfile::default().describe();
        assert!(description.starts_with("Height: not specified"));
        assert!(description.ends_with("Color preferences: not specified"));
    }

    #[test]
    fn enums_use_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&BodyType::PlusSize).unwrap(), "\"plus_size\"");
        let aesthetic: Aesthetic = serde_json::from_str("\"streetwear\"").unwrap();
        assert_eq!(aesthetic, Aesthetic::Streetwear);
    }
}
