//! Text-generation service boundary
//!
//! The adapter only sees [`TrackService`]; the HTTP client speaks the
//! OpenAI-compatible chat-completions protocol over `ureq`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::settings::ServiceSettings;

/// One generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub prompt: String,
    pub system: String,
}

/// Free-text reply plus optional usage
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationReply {
    pub content: String,
    /// Total tokens reported by the service, if any
    pub total_tokens: Option<u64>,
}

/// A best-effort text generator. May fail, time out, or return junk.
pub trait TrackService: Send + Sync {
    fn complete(&self, request: &GenerationRequest) -> Result<GenerationReply, GenerationError>;
}

// ── HTTP client ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// Chat-completions client for OpenRouter/OpenAI-style endpoints
pub struct HttpTrackService {
    agent: ureq::Agent,
    url: String,
    api_key: String,
}

impl HttpTrackService {
    pub fn new(settings: &ServiceSettings, api_key: String) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            url: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TrackService for HttpTrackService {
    fn complete(&self, request: &GenerationRequest) -> Result<GenerationReply, GenerationError> {
        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };
        let body = serde_json::to_string(&body)
            .map_err(|e| GenerationError::Malformed(format!("request encoding: {e}")))?;

        let mut resp = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(body.as_bytes())
            .map_err(classify_transport)?;

        let text = resp.body_mut().read_to_string().map_err(classify_transport)?;
        parse_reply(&text)
    }
}

/// Map a ureq failure onto the generation error taxonomy
fn classify_transport(error: ureq::Error) -> GenerationError {
    if let ureq::Error::StatusCode(status) = error {
        return GenerationError::Status(status);
    }
    let message = error.to_string();
    let lower = message.to_lowercase();
    let kind = if matches!(error, ureq::Error::Timeout(_))
        || lower.contains("timeout")
        || lower.contains("timed out")
    {
        "timeout"
    } else if lower.contains("dns") || lower.contains("resolve") {
        "dns"
    } else if lower.contains("connection refused") {
        "connection_refused"
    } else if lower.contains("tls") || lower.contains("certificate") {
        "tls"
    } else {
        "network"
    };
    GenerationError::Transport { kind, message }
}

/// Extract content and usage from a chat-completions body
pub fn parse_reply(body: &str) -> Result<GenerationReply, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Malformed(format!("invalid JSON: {e}")))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::Malformed("no message content".into()))?;
    Ok(GenerationReply {
        content,
        total_tokens: parsed.usage.map(|u| u.total_tokens),
    })
}

// ── Offline ───────────────────────────────────────────────────────────

/// Always unavailable; every chunk comes from the procedural fallback
#[derive(Debug, Clone)]
pub struct OfflineService {
    reason: String,
}

impl OfflineService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TrackService for OfflineService {
    fn complete(&self, _request: &GenerationRequest) -> Result<GenerationReply, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }
}

/// Replays canned replies in order, then fails
#[cfg(test)]
pub(crate) struct ScriptedService {
    replies: parking_lot::Mutex<std::collections::VecDeque<Result<GenerationReply, GenerationError>>>,
    pub(crate) requests: parking_lot::Mutex<Vec<GenerationRequest>>,
}

#[cfg(test)]
impl ScriptedService {
    pub(crate) fn new(replies: Vec<Result<GenerationReply, GenerationError>>) -> Self {
        Self {
            replies: parking_lot::Mutex::new(replies.into()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn text(content: &str, total_tokens: Option<u64>) -> Self {
        Self::new(vec![Ok(GenerationReply {
            content: content.to_string(),
            total_tokens,
        })])
    }

    pub(crate) fn failing() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
impl TrackService for ScriptedService {
    fn complete(&self, request: &GenerationRequest) -> Result<GenerationReply, GenerationError> {
        self.requests.lock().push(request.clone());
        self.replies.lock().pop_front().unwrap_or(Err(GenerationError::Transport {
            kind: "timeout",
            message: "scripted failure".into(),
        }))
    }
}
