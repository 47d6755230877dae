use sqlx::PgPool;
use utoipa::OpenApi;

pub mod analyzer;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod storage;
pub mod stylist;
pub mod types;

pub use config::AppConfig;

use analyzer::AnalyzerSettings;
use gateway::AiGateway;
use models::ClosetCache;
use storage::ObjectStore;

pub struct AppState {
    pub pool: PgPool,
    pub gateway: AiGateway,
    pub storage: ObjectStore,
    pub closet_cache: ClosetCache,
    pub analyzer: AnalyzerSettings,
}

#[derive(OpenApi)]
#[openapi(components(schemas(
    models::Category,
    models::ClothingItem,
    models::BodyType,
    models::Aesthetic,
    models::UserProfile,
    analyzer::WardrobeAnalysis,
    analyzer::WardrobeSummary,
    analyzer::SuggestionGroup,
    analyzer::SuggestedItem,
    analyzer::SuggestionKind,
    types::UploadClothingQuery,
    types::ClothingAnalysis,
    types::UpdateProfileRequest,
    types::RecommendOutfitsRequest,
    types::Outfit,
    types::OutfitsResponse,
    types::Role,
    types::ChatMessage,
    types::StylistChatRequest,
)))]
pub struct ApiDoc;
