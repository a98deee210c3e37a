//! Content moderation via an external text classifier.
//!
//! One chat-completion call with a fixed policy prompt and a request
//! timeout. When the upstream is unavailable or its reply is unusable, the
//! configured fallback policy decides the verdict - the same policy on
//! every failure path. Classification never fails the write: every path,
//! live or fallback, yields a verdict with a reason.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest content prefix included in log events.
const PREVIEW_LEN: usize = 50;

const POLICY_PROMPT: &str = r#"You are a content moderator for a local community app where people post short anonymous notes about their area.

Your job is to check if the following post should be BLOCKED. Only block content that contains:
- Hate speech (racism, sexism, homophobia, religious hatred, etc.)
- NSFW/explicit sexual content
- Violent threats or calls for violence
- Slurs or derogatory language targeting groups
- Spam or meaningless gibberish

DO NOT block:
- General complaints or negative opinions (even harsh criticism is fine)
- Profanity that isn't hateful (casual swearing is ok)
- Political opinions
- Sarcasm or jokes (unless they contain hate speech)

Be lenient - when in doubt, allow the post. We want free expression, just not hate.

Always respond with JSON: {"allowed": true/false, "reason": "brief explanation of your decision"}

Post to moderate:"#;

/// A moderation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: String,
}

/// What happens when the classifier cannot be reached or understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Publish the post and record that moderation was unavailable
    Open,
    /// Hide the post and record that moderation was unavailable
    Closed,
}

impl FallbackPolicy {
    pub fn from_env_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    fn verdict(self) -> Verdict {
        match self {
            Self::Open => Verdict {
                allowed: true,
                reason: "moderation unavailable, allowed by default".to_string(),
            },
            Self::Closed => Verdict {
                allowed: false,
                reason: "moderation unavailable, blocked by default".to_string(),
            },
        }
    }
}

/// Content classification, behind a trait so the pipeline can be exercised
/// without the network. Infallible: transport failures are resolved
/// internally by the fallback policy.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(&self, content: &str) -> Verdict;
}

/// Client for the moderation classifier upstream (an OpenAI-style
/// chat-completions endpoint).
pub struct Moderator {
    client: reqwest::Client,
    endpoint: Option<String>,
    token: Option<String>,
    model: String,
    fallback: FallbackPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl Moderator {
    /// Create a moderator. `endpoint` of `None` disables classification:
    /// everything is allowed with a "skipped" reason.
    pub fn new(
        endpoint: Option<String>,
        token: Option<String>,
        model: String,
        fallback: FallbackPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(CLASSIFIER_TIMEOUT)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            token,
            model,
            fallback,
        })
    }

    async fn classify_remote(&self, endpoint: &str, content: &str) -> Result<Verdict> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{POLICY_PROMPT}\n\n\"{content}\""),
            }],
        };

        let mut call = self.client.post(endpoint).json(&request);
        if let Some(token) = &self.token {
            call = call.bearer_auth(token);
        }

        let response = call
            .send()
            .await
            .map_err(|e| Error::ModerationUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::ModerationUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ModerationUnavailable(e.to_string()))?;
        let text = reply
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| Error::ModerationUnavailable("empty reply".to_string()))?;

        parse_verdict(text)
            .ok_or_else(|| Error::ModerationUnavailable("unparseable verdict".to_string()))
    }
}

#[async_trait]
impl ContentClassifier for Moderator {
    async fn classify(&self, content: &str) -> Verdict {
        let preview = preview(content);

        let Some(endpoint) = &self.endpoint else {
            tracing::info!(content = %preview, "moderation skipped, classifier not configured");
            return Verdict {
                allowed: true,
                reason: "moderation skipped (classifier not configured)".to_string(),
            };
        };

        match self.classify_remote(endpoint, content).await {
            Ok(verdict) => {
                tracing::info!(
                    allowed = verdict.allowed,
                    reason = %verdict.reason,
                    content = %preview,
                    "moderation verdict"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    content = %preview,
                    fallback = ?self.fallback,
                    "moderation unavailable, applying fallback policy"
                );
                self.fallback.verdict()
            }
        }
    }
}

/// Pull the verdict object out of a model reply. Models wrap JSON in prose
/// or code fences, so this takes the outermost braced span.
fn parse_verdict(text: &str) -> Option<Verdict> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    serde_json::from_str(text.get(start..=end)?).ok()
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_LEN).collect()
}
