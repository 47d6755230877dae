use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RecommendOutfitsRequest {
    pub occasion: String,
    pub weather: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Outfit {
    pub name: String,
    pub items: Vec<String>,
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OutfitsResponse {
    pub outfits: Vec<Outfit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OutfitsResponse {
    pub fn empty_closet() -> Self {
        OutfitsResponse {
            outfits: Vec::new(),
            message: Some("No clothes in closet".to_string()),
        }
    }

    /// A model answer with zero outfits is reported as "nothing found", not as an error.
    pub fn with_empty_notice(mut self) -> Self {
        if self.outfits.is_empty() && self.message.is_none() {
            self.message =
                Some("No outfits found. Try uploading more items to your closet!".to_string());
        }
        self
    }
}
