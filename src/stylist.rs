//! Client side of the stylist chat.
//!
//! [`DeltaParser`] rebuilds the assistant reply from a `text/event-stream` body
//! delivered in arbitrary byte chunks. [`Conversation`] keeps committed history
//! apart from the reply still being streamed, and [`StylistClient`] ties the
//! two together over HTTP.

use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{ChatMessage, StylistChatRequest};

pub const DEFAULT_MAX_MALFORMED_RETRIES: usize = 3;
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Error)]
pub enum StylistError {
    #[error("Failed to start stream: {0}")]
    StreamStartFailure(String),
    #[error("Stream interrupted: {0}")]
    Transport(String),
    #[error("Malformed stream payload: {0}")]
    MalformedPayload(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserState {
    /// Waiting for a complete line.
    Buffering,
    /// The last complete line carried a decodable payload.
    Emitting,
    /// The `[DONE]` sentinel was seen. Further input is ignored.
    Done,
    /// A payload failed to decode and was pushed back to await more bytes.
    MalformedRecoverable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Full assistant content so far, after appending the latest delta.
    Content(String),
    Done,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug)]
pub struct DeltaParser {
    buffer: Vec<u8>,
    content: String,
    state: ParserState,
    malformed_retries: usize,
    max_malformed_retries: usize,
}

impl Default for DeltaParser {
    fn default() -> Self {
        DeltaParser::with_max_malformed_retries(DEFAULT_MAX_MALFORMED_RETRIES)
    }
}

impl DeltaParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_malformed_retries(max_malformed_retries: usize) -> Self {
        DeltaParser {
            buffer: Vec::new(),
            content: String::new(),
            state: ParserState::Buffering,
            malformed_retries: 0,
            max_malformed_retries,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consumes one read from the underlying stream and returns what it resolved.
    ///
    /// Only `\n`-terminated lines are interpreted; the remainder stays buffered, so
    /// a line (or a UTF-8 sequence) split across reads is handled once complete.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>, StylistError> {
        let mut events = Vec::new();
        if self.is_done() {
            return Ok(events);
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw[..newline]).into_owned();
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if line.trim().is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(payload) = line.strip_prefix("data: ") else {
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_SENTINEL {
                self.state = ParserState::Done;
                self.buffer.clear();
                events.push(StreamEvent::Done);
                return Ok(events);
            }

            match serde_json::from_str::<StreamChunk>(payload) {
                Ok(chunk) => {
                    self.malformed_retries = 0;
                    self.state = ParserState::Emitting;

                    let delta = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta)
                        .and_then(|delta| delta.content)
                        .unwrap_or_default();

                    if !delta.is_empty() {
                        self.content.push_str(&delta);
                        events.push(StreamEvent::Content(self.content.clone()));
                    }
                }
                Err(e) => {
                    self.malformed_retries += 1;
                    if self.malformed_retries > self.max_malformed_retries {
                        warn!(
                            "Giving up on stream payload after {} attempts: {}",
                            self.malformed_retries, e
                        );
                        return Err(StylistError::MalformedPayload(e.to_string()));
                    }

                    debug!("Re-buffering undecodable payload: {}", e);
                    let mut restored = raw;
                    restored.append(&mut self.buffer);
                    self.buffer = restored;
                    self.state = ParserState::MalformedRecoverable;
                    return Ok(events);
                }
            }
        }

        if self.state != ParserState::MalformedRecoverable {
            self.state = ParserState::Buffering;
        }
        Ok(events)
    }

    /// Ends parsing at end-of-stream and yields the reconstructed reply.
    ///
    /// A stream that ends while a payload is still undecodable lost everything
    /// after that line, so it is reported as `MalformedPayload`.
    pub fn finish(self) -> Result<String, StylistError> {
        if self.state == ParserState::MalformedRecoverable {
            warn!("Stream ended with an undecodable payload still buffered");
            let line = String::from_utf8_lossy(&self.buffer);
            return Err(StylistError::MalformedPayload(format!(
                "stream ended on undecodable line: {}",
                line.lines().next().unwrap_or_default()
            )));
        }
        if !self.buffer.is_empty() && self.state != ParserState::Done {
            debug!("Discarding {} unterminated trailing bytes", self.buffer.len());
        }
        Ok(self.content)
    }
}

/// Committed chat history. The reply being streamed lives in a [`PendingReply`]
/// and only joins the history on [`PendingReply::commit`].
#[derive(Clone, Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Records the user's message and opens a pending assistant reply.
    pub fn begin_turn(&mut self, text: impl Into<String>) -> PendingReply<'_> {
        self.messages.push(ChatMessage::user(text));
        PendingReply {
            conversation: self,
            content: String::new(),
        }
    }
}

/// Dropping without committing discards the reply.
#[derive(Debug)]
pub struct PendingReply<'a> {
    conversation: &'a mut Conversation,
    content: String,
}

impl PendingReply<'_> {
    pub fn history(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn update(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn commit(self) -> ChatMessage {
        let message = ChatMessage::assistant(self.content);
        self.conversation.messages.push(message.clone());
        message
    }
}

#[derive(Debug, Clone)]
pub struct StylistClient {
    client: reqwest::Client,
    endpoint: String,
    max_malformed_retries: usize,
}

impl StylistClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
            max_malformed_retries: DEFAULT_MAX_MALFORMED_RETRIES,
        }
    }

    pub fn with_max_malformed_retries(mut self, max_malformed_retries: usize) -> Self {
        self.max_malformed_retries = max_malformed_retries;
        self
    }

    /// Sends `text` and streams the reply, calling `on_update` with the full
    /// content after every delta. The reply is committed to `conversation` only
    /// on success; any failure, or dropping this future, leaves no assistant
    /// message behind.
    pub async fn send<F>(
        &self,
        conversation: &mut Conversation,
        access_token: &str,
        text: &str,
        mut on_update: F,
    ) -> Result<ChatMessage, StylistError>
    where
        F: FnMut(&str),
    {
        let mut pending = conversation.begin_turn(text);
        let request = StylistChatRequest {
            messages: pending.history().to_vec(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| StylistError::StreamStartFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Stylist chat returned {}: {}", status, body);
            return Err(StylistError::StreamStartFailure(format!(
                "status {}",
                status.as_u16()
            )));
        }
        if status == reqwest::StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(StylistError::StreamStartFailure(
                "response has no body".to_string(),
            ));
        }

        let stream = response.bytes_stream();
        tokio::pin!(stream);
        let mut parser = DeltaParser::with_max_malformed_retries(self.max_malformed_retries);

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| StylistError::Transport(e.to_string()))?;
            for event in parser.feed(&bytes)? {
                if let StreamEvent::Content(content) = event {
                    on_update(&content);
                    pending.update(content);
                }
            }
            if parser.is_done() {
                break;
            }
        }

        pending.update(parser.finish()?);
        let message = pending.commit();
        info!("Stylist reply committed ({} chars)", message.content.len());
        Ok(message)
    }
}
