use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{Aesthetic, BodyType, UserProfile};

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub height_cm: Option<i32>,
    pub body_type: Option<BodyType>,
    #[serde(default)]
    pub aesthetics: Vec<Aesthetic>,
    #[serde(default)]
    pub color_preferences: Vec<String>,
    pub location: Option<String>,
}

impl UpdateProfileRequest {
    /// Validates and normalizes the edit into a profile for `user_id`.
    pub fn into_profile(self, user_id: &str) -> Result<UserProfile, AppError> {
        if let Some(height) = self.height_cm {
            if height <= 0 {
                return Err(AppError::Validation(
                    "Height must be a positive number of centimeters".to_string(),
                ));
            }
        }

        let mut aesthetics: Vec<Aesthetic> = Vec::new();
        for aesthetic in self.aesthetics {
            if !aesthetics.contains(&aesthetic) {
                aesthetics.push(aesthetic);
            }
        }

        let color_preferences = self
            .color_preferences
            .iter()
            .flat_map(|c| c.split(','))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let location = self
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(UserProfile {
            id: user_id.to_string(),
            height_cm: self.height_cm,
            body_type: self.body_type,
            aesthetics,
            color_preferences,
            location,
            updated_at: Utc::now(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_height() {
        let request = UpdateProfileRequest {
            height_cm: Some(0),
            body_type: None,
            aesthetics: vec![],
            color_preferences: vec![],
            location: None,
        };
        assert!(matches!(
            request.into_profile("user_1"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn normalizes_colors_and_location() {
        let request = UpdateProfileRequest {
            height_cm: Some(165),
            body_type: Some(BodyType::Petite),
            aesthetics: vec![Aesthetic::Casual, Aesthetic::Casual],
            color_preferences: vec!["navy, olive".into(), " ".into(), "black".into()],
            location: Some("  ".into()),
        };
        let profile = request.into_profile("user_1").unwrap();

        assert_eq!(profile.id, "user_1");
        assert_eq!(profile.aesthetics, vec![Aesthetic::Casual]);
        assert_eq!(profile.color_preferences, vec!["navy", "olive", "black"]);
        assert_eq!(profile.location, None);
    }
}
