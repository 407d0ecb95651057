//! hookcat: tee stdin into a chat webhook.
//!
//! Every line read from stdin is echoed to stdout unchanged and delivered to
//! a webhook, either one message per line or as one batch split into
//! messages of at most [`MAX_MESSAGE_LENGTH`] bytes.
//!
//! # Delivery
//!
//! - A shared token bucket ([`RateLimiter`]) allows a burst of 5 requests
//!   and one more per second after that.
//! - Each message is retried with linear backoff; failures are counted in
//!   [`Metrics`] and never stop the run.
//! - On Ctrl-C or SIGTERM the [`Pipeline`] stops reading, flushes what it
//!   has buffered and waits for every in-flight delivery.
//!
//! ```text
//! stdin -> Pipeline -> stdout
//!             |
//!             +-> WebhookSender (rate limit, retry) -> webhook
//! ```

pub mod ansi;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod rate_limiter;
pub mod sender;
pub mod shutdown;
pub mod splitter;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigSources};
pub use error::{exit_code, HookcatError, HookcatResult};
pub use metrics::{Metrics, MetricsSnapshot};
pub use pipeline::{Pipeline, PipelineState};
pub use rate_limiter::RateLimiter;
pub use sender::{DeliveryOutcome, HttpTransport, Transport, WebhookSender};
pub use splitter::{split_message, MAX_MESSAGE_LENGTH};
