use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, ImageUrlArgs,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, UpstreamFailure};
use crate::models::{Category, ClothingItem, UserProfile};
use crate::prompts::Prompts;
use crate::types::{
    prompt_catalog, ChatMessage, ClothingAnalysis, Outfit, OutfitsResponse, Role,
};

lazy_static! {
    static ref JSON_OBJECT_REGEX: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

const FALLBACK_DESCRIPTION_CHARS: usize = 200;

/// Client for the OpenAI-compatible AI gateway that tags images, suggests
/// outfits and streams stylist replies.
#[derive(Debug, Clone)]
pub struct AiGateway {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeasonField {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    season: Option<SeasonField>,
}

#[derive(Deserialize)]
struct OutfitsPayload {
    outfits: Vec<Outfit>,
}

impl AiGateway {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            request_timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.ai_gateway_api_key.clone(),
            config.ai_gateway_base_url.clone(),
            config.ai_model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn send(
        &self,
        request: &CreateChatCompletionRequest,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}/chat/completions", self.api_base);
        let mut builder = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            error!("AI gateway request failed: {}", e);
            AppError::Upstream(UpstreamFailure::Transport(e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            error!("AI gateway error {}: {}", status, error_body);
            return Err(AppError::Upstream(UpstreamFailure::from_status(
                status.as_u16(),
            )));
        }

        Ok(response)
    }

    async fn complete_text(&self, request: CreateChatCompletionRequest) -> Result<String, AppError> {
        let response = self.send(&request, Some(self.request_timeout)).await?;
        let body = response.text().await.map_err(|e| {
            error!("Failed to read AI gateway response: {}", e);
            AppError::Upstream(UpstreamFailure::Transport(e.to_string()))
        })?;

        Ok(completion_text(&body))
    }

    pub async fn analyze_clothing(
        &self,
        image_url: &str,
        category: Category,
    ) -> Result<ClothingAnalysis, AppError> {
        if image_url.trim().is_empty() {
            return Err(AppError::Validation("Missing imageUrl".to_string()));
        }
        info!("Analyzing clothing image: {} Category: {}", image_url, category);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.7_f32)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(Prompts::ANALYZE_CLOTHING)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(vec![
                        ChatCompletionRequestMessageContentPartTextArgs::default()
                            .text(Prompts::analyze_request(&category.to_string()))
                            .build()?
                            .into(),
                        ChatCompletionRequestMessageContentPartImageArgs::default()
                            .image_url(ImageUrlArgs::default().url(image_url).build()?)
                            .build()?
                            .into(),
                    ])
                    .build()?
                    .into(),
            ])
            .build()?;

        let text = self.complete_text(request).await?;
        debug!("AI analysis response: {}", text);
        Ok(parse_analysis(&text, category))
    }

    /// Suggests outfits from the user's current catalog. An empty catalog is
    /// answered locally without calling the model.
    pub async fn recommend_outfits(
        &self,
        profile: Option<&UserProfile>,
        items: &[ClothingItem],
        occasion: &str,
        weather: &str,
    ) -> Result<OutfitsResponse, AppError> {
        if items.is_empty() {
            return Ok(OutfitsResponse::empty_closet());
        }
        info!(
            "Generating outfit recommendations from {} items for: {} / {}",
            items.len(),
            occasion,
            weather
        );

        let profile_line = profile.map(|p| p.describe());
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.8_f32)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(Prompts::RECOMMEND_OUTFITS)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(Prompts::recommend_request(
                        occasion,
                        weather,
                        profile_line.as_deref(),
                        &prompt_catalog(items),
                    ))
                    .build()?
                    .into(),
            ])
            .build()?;

        let text = self.complete_text(request).await?;
        debug!("AI recommendation response: {}", text);
        Ok(parse_outfits(&text, items))
    }

    /// Opens a streaming completion. The caller owns the returned byte stream.
    pub async fn open_chat_stream(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
    ) -> Result<reqwest::Response, AppError> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()?
                .into()];

        for message in history {
            let message: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.as_str())
                    .build()?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()?
                    .into(),
            };
            messages.push(message);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .stream(true)
            .build()?;

        // No overall timeout: replies may stream for longer than a plain request.
        self.send(&request, None).await
    }
}

/// Pulls the assistant text out of a completion envelope. A body that is not
/// a completion envelope is treated as the text itself.
fn completion_text(body: &str) -> String {
    match serde_json::from_str::<CompletionResponse>(body) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default(),
        Err(e) => {
            warn!("AI gateway returned a non-JSON body: {}", e);
            body.to_string()
        }
    }
}

fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT_REGEX.find(text).map(|m| m.as_str())
}

fn split_seasons(raw: &str) -> Vec<String> {
    raw.split([',', '/'])
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn fallback_analysis(text: &str, category: Category) -> ClothingAnalysis {
    ClothingAnalysis {
        description: text.chars().take(FALLBACK_DESCRIPTION_CHARS).collect(),
        color: "unknown".to_string(),
        subcategory: category.to_string(),
        tags: vec![category.to_string()],
        material: "unknown".to_string(),
        season: vec!["all-season".to_string()],
    }
}

pub fn parse_analysis(text: &str, category: Category) -> ClothingAnalysis {
    let parsed = extract_json_object(text).and_then(|json| {
        serde_json::from_str::<RawAnalysis>(json)
            .map_err(|e| error!("Failed to parse AI response as JSON: {}", e))
            .ok()
    });

    let Some(raw) = parsed else {
        return fallback_analysis(text, category);
    };

    let season = match raw.season {
        Some(SeasonField::One(season)) => split_seasons(&season),
        Some(SeasonField::Many(seasons)) => seasons
            .iter()
            .flat_map(|s| split_seasons(s))
            .collect(),
        None => Vec::new(),
    };

    ClothingAnalysis {
        description: raw.description.unwrap_or_default(),
        color: raw.color.unwrap_or_else(|| "unknown".to_string()),
        subcategory: raw.subcategory.unwrap_or_else(|| category.to_string()),
        tags: raw.tags,
        material: raw.material.unwrap_or_else(|| "unknown".to_string()),
        season: if season.is_empty() {
            vec!["all-season".to_string()]
        } else {
            season
        },
    }
}

pub fn fallback_outfits(items: &[ClothingItem]) -> OutfitsResponse {
    OutfitsResponse {
        outfits: vec![Outfit {
            name: "Casual Everyday Look".to_string(),
            items: items
                .iter()
                .take(3)
                .map(|item| format!("{} {}", item.color, item.subcategory))
                .collect(),
            reasoning: "A simple combination from your closet that works for most occasions."
                .to_string(),
        }],
        message: None,
    }
}

pub fn parse_outfits(text: &str, items: &[ClothingItem]) -> OutfitsResponse {
    match extract_json_object(text).map(serde_json::from_str::<OutfitsPayload>) {
        Some(Ok(payload)) => OutfitsResponse {
            outfits: payload.outfits,
            message: None,
        },
        Some(Err(e)) => {
            error!("Failed to parse AI response: {}", e);
            fallback_outfits(items)
        }
        None => {
            error!("No JSON found in AI response");
            fallback_outfits(items)
        }
    }
}
