//! Webhook sender with rate limiting and linear-backoff retry.

use crate::ansi::strip_ansi;
use crate::metrics::Metrics;
use crate::rate_limiter::RateLimiter;
use crate::{HookcatError, HookcatResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Per-attempt request timeout, independent of the client-wide timeout.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backoff step: the wait after failed attempt `n` is `n` times this.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Request body expected by the webhook.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Outbound half of a delivery attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to the webhook and return the response status code.
    async fn post_json(&self, body: Vec<u8>) -> HookcatResult<u16>;
}

/// reqwest-backed transport for a single webhook URL.
pub struct HttpTransport {
    client: Client,
    url: String,
    client_timeout: Duration,
    attempt_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport whose client enforces `client_timeout` overall.
    pub fn new(url: impl Into<String>, client_timeout: Duration) -> HookcatResult<Self> {
        let client = Client::builder().timeout(client_timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
            client_timeout,
            attempt_timeout: ATTEMPT_TIMEOUT,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deadline for one request: the shorter of the client and attempt timeouts.
    ///
    /// A per-request timeout replaces the client-wide one in reqwest, so both
    /// limits are folded into a single value here.
    pub fn request_timeout(&self) -> Duration {
        self.attempt_timeout.min(self.client_timeout)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, body: Vec<u8>) -> HookcatResult<u16> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.request_timeout())
            .body(body)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

/// Terminal result of delivering one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The webhook accepted the message.
    Sent { attempts: u32 },
    /// Nothing to send; no request was made.
    Empty,
    /// Every attempt failed, or the failure was not retryable.
    Failed { attempts: u32 },
}

/// Delivers messages through a [`Transport`], one retry loop per message.
///
/// Many `send_with_retry` calls may run at once. They share the rate limiter
/// and the metrics and nothing else.
pub struct WebhookSender {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<Metrics>,
    max_retries: u32,
    backoff_unit: Duration,
}

impl WebhookSender {
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        metrics: Arc<Metrics>,
        max_retries: u32,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            metrics,
            max_retries,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    /// Override the backoff step.
    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Deliver `content`, retrying up to `max_retries` times.
    ///
    /// Failed attempt `n` is followed by a sleep of `n * backoff_unit`. The
    /// outcome is recorded in the metrics; errors never escape this call.
    pub async fn send_with_retry(&self, content: &str) -> DeliveryOutcome {
        if content.is_empty() {
            return DeliveryOutcome::Empty;
        }

        let max_attempts = self.max_retries + 1;

        for attempt in 1..=max_attempts {
            match self.try_send(content).await {
                Ok(status) => {
                    self.metrics.record_sent(content.len());
                    debug!(status, attempt, bytes = content.len(), "Message sent successfully");
                    return DeliveryOutcome::Sent { attempts: attempt };
                }
                Err(e) if !e.is_retryable() => {
                    self.metrics.record_failed();
                    error!(attempt, error = %e, "Message delivery failed permanently");
                    return DeliveryOutcome::Failed { attempts: attempt };
                }
                Err(e) => {
                    debug!(attempt, max_attempts, error = %e, "Send attempt failed");

                    if attempt < max_attempts {
                        let backoff = self.backoff_unit * attempt;
                        debug!(backoff_ms = backoff.as_millis() as u64, "Backing off before retry");
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        self.metrics.record_failed();
        error!(max_attempts, "Failed to send message after retries");
        DeliveryOutcome::Failed {
            attempts: max_attempts,
        }
    }

    /// One rate-limited delivery attempt.
    async fn try_send(&self, content: &str) -> HookcatResult<u16> {
        self.rate_limiter.acquire().await;

        let text = strip_ansi(content);
        let body = serde_json::to_vec(&WebhookPayload { content: &text })?;

        let status = self.transport.post_json(body).await?;
        if status >= 400 {
            return Err(HookcatError::Rejected { status });
        }

        Ok(status)
    }
}
