use actix_web::{post, web, Error, HttpResponse, Responder};
use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppError, UpstreamFailure};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ClothingItem, UserProfile};
use crate::prompts::Prompts;
use crate::stylist::{DeltaParser, StreamEvent};
use crate::types::{prompt_catalog, ChatMessage, StylistChatRequest};
use crate::AppState;

pub const MAX_HISTORY_MESSAGES: usize = 20;

const NO_PROFILE: &str = "No profile information available";

/// Keeps the most recent `MAX_HISTORY_MESSAGES` messages.
pub fn recent_history(mut messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    if messages.len() > MAX_HISTORY_MESSAGES {
        messages = messages.split_off(messages.len() - MAX_HISTORY_MESSAGES);
    }
    messages
}

/// Follows a relayed stylist stream to log the size of the reply. Logs once,
/// either at `[DONE]` or when the relay is dropped without it.
struct ReplyTap {
    user_id: String,
    parser: Option<DeltaParser>,
}

impl ReplyTap {
    fn new(user_id: impl Into<String>) -> Self {
        ReplyTap {
            user_id: user_id.into(),
            parser: Some(DeltaParser::new()),
        }
    }

    fn observe(&mut self, bytes: &[u8]) {
        let Some(parser) = self.parser.as_mut() else {
            return;
        };
        match parser.feed(bytes) {
            Ok(events) if events.contains(&StreamEvent::Done) => {
                info!(
                    "Stylist reply for {} finished: {} chars",
                    self.user_id,
                    parser.content().chars().count()
                );
                self.parser = None;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Could not follow stylist stream for {}: {}", self.user_id, e);
                self.parser = None;
            }
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        self.parser.is_some()
    }
}

impl Drop for ReplyTap {
    fn drop(&mut self) {
        if let Some(parser) = self.parser.take() {
            warn!(
                "Stylist stream for {} ended without [DONE] after {} chars",
                self.user_id,
                parser.content().chars().count()
            );
        }
    }
}

#[post("/stylist/chat")]
async fn stylist_chat(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<StylistChatRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = &authenticated_user.user_id;
    let messages = req_body.into_inner().messages;

    // Ensure we have at least one message, else return an error
    if messages.is_empty() {
        return Err(AppError::Validation(
            "At least one message is required".to_string(),
        ));
    }
    let messages = recent_history(messages);

    // Missing context degrades the prompt instead of failing the chat.
    let profile_line = match UserProfile::get(&app_state.pool, user_id).await {
        Ok(Some(profile)) => profile.describe(),
        Ok(None) => NO_PROFILE.to_string(),
        Err(e) => {
            error!("Error loading profile for stylist chat: {:?}", e);
            NO_PROFILE.to_string()
        }
    };
    let items = ClothingItem::list_for_user(&app_state.pool, &app_state.closet_cache, user_id)
        .await
        .unwrap_or_else(|e| {
            error!("Error loading clothes for stylist chat: {:?}", e);
            Vec::new()
        });
    let system_prompt = Prompts::stylist_system(&profile_line, &prompt_catalog(&items));

    info!(
        "User {} opened a stylist chat with {} messages and {} items",
        user_id,
        messages.len(),
        items.len()
    );

    let upstream = app_state
        .gateway
        .open_chat_stream(&system_prompt, &messages)
        .await
        .map_err(|e| {
            error!("Failed to open stylist stream: {:?}", e);
            match e {
                AppError::Upstream(UpstreamFailure::Status(status)) => {
                    AppError::StreamStart(format!("upstream status {}", status))
                }
                other => other,
            }
        })?;

    // Relay the bytes unchanged, reconstructing the reply only for logging.
    let mut tap = ReplyTap::new(user_id.clone());
    let stream = upstream
        .bytes_stream()
        .map(move |chunk| match chunk {
            Ok(bytes) => {
                tap.observe(&bytes);
                Ok::<Bytes, Error>(bytes)
            }
            Err(e) => {
                error!("Stylist stream interrupted: {}", e);
                Err(actix_web::error::ErrorBadGateway(e.to_string()))
            }
        })
        .boxed();

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(len: usize) -> Vec<ChatMessage> {
        (0..len)
            .map(|i| ChatMessage::user(format!("message {}", i)))
            .collect()
    }

    #[test]
    fn short_history_is_kept_whole() {
        assert!(recent_history(Vec::new()).is_empty());
        assert_eq!(recent_history(history(20)), history(20));
    }

    #[test]
    fn long_history_keeps_latest_messages() {
        let kept = recent_history(history(25));

        assert_eq!(kept.len(), MAX_HISTORY_MESSAGES);
        assert_eq!(kept.first().map(|m| m.content.as_str()), Some("message 5"));
        assert_eq!(kept.last().map(|m| m.content.as_str()), Some("message 24"));
    }

    #[test]
    fn tap_closes_at_done() {
        let mut tap = ReplyTap::new("user_1");
        tap.observe(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n");
        assert!(tap.is_open());

        tap.observe(b"data: [DONE]\n");
        assert!(!tap.is_open());
    }

    #[test]
    fn tap_stays_open_on_truncated_relay() {
        let mut tap = ReplyTap::new("user_1");
        tap.observe(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n");

        // Still open, so dropping it reports the missing sentinel.
        assert!(tap.is_open());
        drop(tap);
    }
}
