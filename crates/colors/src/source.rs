//! Color sources behind the tool.

use std::future::Future;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::WebhookError;
use crate::input::ColorRequest;

/// Default endpoint for the remote color service.
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/mood-colors";

/// Counts accepted by the remote service when clamping is on.
pub const CLAMPED_COUNT_RANGE: RangeInclusive<u32> = 1..=2;

/// Shown when a remote call fails in a way that cannot be classified.
pub const FALLBACK_MESSAGE: &str =
    "I couldn't reach the color service right now. Please try again in a moment.";

/// Shown when the service rejects a request because of its count limit.
pub const COUNT_LIMIT_MESSAGE: &str =
    "Sorry, I can only suggest up to 2 colors at a time. Please ask for 1 or 2 colors.";

/// Shown for any other rejected or failed clamped request.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't get colors for that mood right now. Please try again.";

/// Something that can turn a validated request into color text.
///
/// Implementations always answer with text; failures become messages.
pub trait ColorSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Highest `count` this source will act on, if bounded.
    fn max_count(&self) -> Option<u32> {
        None
    }

    fn colors(&self, request: &ColorRequest) -> impl Future<Output = String> + Send;
}

/// How a [`WebhookSource`] treats counts and rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookMode {
    /// Forward the count verbatim and relay whatever message comes back.
    Passthrough,
    /// Force the count into [`CLAMPED_COUNT_RANGE`] and map `success: false`
    /// to fixed user-facing messages.
    Clamped,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest<'a> {
    color_count: u32,
    mood: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: String,
}

fn default_success() -> bool {
    true
}

/// Delegates color selection to a remote webhook.
#[derive(Debug, Clone)]
pub struct WebhookSource {
    client: reqwest::Client,
    url: String,
    mode: WebhookMode,
}

impl WebhookSource {
    pub fn new(url: impl Into<String>, mode: WebhookMode) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            mode,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> WebhookMode {
        self.mode
    }

    /// The request actually sent for `request`.
    fn outbound(&self, request: &ColorRequest) -> ColorRequest {
        match self.mode {
            WebhookMode::Passthrough => request.clone(),
            WebhookMode::Clamped => request.clamped(&CLAMPED_COUNT_RANGE),
        }
    }

    async fn fetch(&self, request: &ColorRequest) -> Result<String, WebhookError> {
        let payload = WebhookRequest {
            color_count: request.count,
            mood: &request.mood,
        };
        tracing::info!(url = %self.url, mood = %payload.mood, color_count = payload.color_count, "calling color webhook");

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::info!(%status, "color webhook answered");
        tracing::debug!(%body, "color webhook body");

        let reply: WebhookResponse = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) => return Err(WebhookError::Decode { body }),
        };

        if !reply.success && self.mode == WebhookMode::Clamped {
            return Err(WebhookError::Rejected {
                message: reply.message,
            });
        }
        if reply.message.trim().is_empty() {
            // Nothing to relay; show what the service sent.
            return Ok(body);
        }
        Ok(reply.message)
    }

    /// Map a failure to the text returned to the caller.
    fn describe(&self, error: WebhookError) -> String {
        match (error, self.mode) {
            (WebhookError::Decode { body }, _) => body,
            (WebhookError::Rejected { message }, _) if mentions_count_limit(&message) => {
                COUNT_LIMIT_MESSAGE.to_string()
            }
            (_, WebhookMode::Clamped) => GENERIC_FAILURE_MESSAGE.to_string(),
            (_, WebhookMode::Passthrough) => FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl ColorSource for WebhookSource {
    fn name(&self) -> &'static str {
        match self.mode {
            WebhookMode::Passthrough => "webhook",
            WebhookMode::Clamped => "webhook-clamped",
        }
    }

    fn max_count(&self) -> Option<u32> {
        match self.mode {
            WebhookMode::Passthrough => None,
            WebhookMode::Clamped => Some(*CLAMPED_COUNT_RANGE.end()),
        }
    }

    async fn colors(&self, request: &ColorRequest) -> String {
        let outbound = self.outbound(request);
        match self.fetch(&outbound).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "color webhook failed");
                self.describe(e)
            }
        }
    }
}

fn mentions_count_limit(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("count") || message.contains("limit")
}
