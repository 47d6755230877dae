use anyhow::anyhow;
use shuttle_runtime::SecretStore;

use crate::analyzer::AnalyzerSettings;

pub const DEFAULT_AI_GATEWAY_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub ai_gateway_api_key: String,
    pub ai_gateway_base_url: String,
    pub ai_model: String,
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub s3_bucket: String,
    pub stale_after_days: i64,
    pub recent_wear_days: i64,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn new(secret_store: &SecretStore) -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| secret_store.get(key))
    }

    /// Builds the config from any key lookup. Required keys error out, tunables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{} not found", key));

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let ai_gateway_api_key = required("AI_GATEWAY_API_KEY")?;
        let aws_region = required("AWS_REGION")?;
        let aws_access_key_id = required("AWS_ACCESS_KEY_ID")?;
        let aws_secret_access_key = required("AWS_SECRET_ACCESS_KEY")?;
        let s3_bucket = required("S3_BUCKET")?;

        let ai_gateway_base_url = lookup("AI_GATEWAY_BASE_URL")
            .unwrap_or_else(|| DEFAULT_AI_GATEWAY_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let ai_model = lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());

        let defaults = AnalyzerSettings::default();
        let stale_after_days = parse_or(&lookup, "STALE_AFTER_DAYS", defaults.stale_after_days)?;
        let recent_wear_days = parse_or(&lookup, "RECENT_WEAR_DAYS", defaults.recent_wear_days)?;
        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 60)?;

        Ok(AppConfig {
            database_url,
            jwt_secret,
            ai_gateway_api_key,
            ai_gateway_base_url,
            ai_model,
            aws_region,
            aws_access_key_id,
            aws_secret_access_key,
            s3_bucket,
            stale_after_days,
            recent_wear_days,
            request_timeout_secs,
        })
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            stale_after_days: self.stale_after_days,
            recent_wear_days: self.recent_wear_days,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} is not a valid number: {}", key, raw)),
        None => Ok(default),
    }
}
