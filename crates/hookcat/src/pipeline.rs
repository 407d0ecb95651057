//! Input-driven orchestration of delivery tasks.
//!
//! The pipeline reads input one line at a time, echoes each line to the
//! output, and turns the input into delivery tasks:
//!
//! - line mode: every line becomes its own message as soon as it is read
//! - batch mode: all lines are buffered and split into chunks once input ends
//!
//! Whether input ends normally or through cancellation, every dispatched
//! task is awaited before `run` returns.
//!
//! ```text
//! Reading ──EOF──▶ Flushing ──▶ AwaitingOutstanding ──▶ Closed
//!    └──cancel──▶ Draining ──▶ AwaitingOutstanding ──▶ Cancelled
//! ```

use crate::config::Config;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::rate_limiter::RateLimiter;
use crate::sender::{DeliveryOutcome, HttpTransport, WebhookSender};
use crate::splitter::{split_message, MAX_MESSAGE_LENGTH};
use crate::{HookcatError, HookcatResult};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Reading and echoing input.
    Reading,
    /// Cancelled mid-input; dispatching what was already buffered.
    Draining,
    /// Input ended; dispatching the batch buffer.
    Flushing,
    /// Waiting for every dispatched delivery to finish.
    AwaitingOutstanding,
    /// Run finished normally.
    Closed,
    /// Run finished after cancellation.
    Cancelled,
}

/// How the read loop ended.
enum ReadEnd {
    Eof,
    Cancelled,
}

/// Drives one run from input to drained deliveries.
pub struct Pipeline {
    one_line: bool,
    sender: Option<Arc<WebhookSender>>,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<Metrics>,
    tasks: JoinSet<DeliveryOutcome>,
    state: PipelineState,
}

impl Pipeline {
    /// Build a pipeline that posts to the configured webhook over HTTP.
    ///
    /// Without a webhook URL the pipeline only echoes input.
    pub fn from_config(config: &Config) -> HookcatResult<Self> {
        let rate_limiter = Arc::new(RateLimiter::new());
        let metrics = Arc::new(Metrics::new());

        let sender = match config.destination() {
            Some(url) => {
                let transport = Arc::new(HttpTransport::new(url, config.timeout)?);
                Some(Arc::new(WebhookSender::new(
                    transport,
                    rate_limiter.clone(),
                    metrics.clone(),
                    config.max_retries,
                )))
            }
            None => None,
        };

        Ok(Self::assemble(config.one_line, sender, rate_limiter, metrics))
    }

    /// Build a pipeline around an existing sender.
    pub fn with_sender(config: &Config, sender: WebhookSender) -> Self {
        let rate_limiter = sender.rate_limiter().clone();
        let metrics = sender.metrics().clone();
        Self::assemble(config.one_line, Some(Arc::new(sender)), rate_limiter, metrics)
    }

    fn assemble(
        one_line: bool,
        sender: Option<Arc<WebhookSender>>,
        rate_limiter: Arc<RateLimiter>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            one_line,
            sender,
            rate_limiter,
            metrics,
            tasks: JoinSet::new(),
            state: PipelineState::Reading,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Delivery tasks dispatched but not yet joined.
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Process `input` until end of input or cancellation.
    ///
    /// Returns [`HookcatError::Cancelled`] if `cancel` fired, and the read or
    /// echo error if one occurred. In every case all dispatched deliveries
    /// have completed and the rate limiter is closed when this returns.
    /// Individual delivery failures are only reflected in the metrics.
    pub async fn run<R, W>(
        &mut self,
        input: R,
        output: W,
        cancel: CancellationToken,
    ) -> HookcatResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.transition(PipelineState::Reading);

        let mut batch = String::new();
        let read_result = self.read_input(input, output, &cancel, &mut batch).await;

        match read_result {
            Ok(ReadEnd::Cancelled) => self.transition(PipelineState::Draining),
            _ => self.transition(PipelineState::Flushing),
        }
        self.flush_batch(&batch);

        self.transition(PipelineState::AwaitingOutstanding);
        self.await_outstanding().await;
        self.rate_limiter.close();

        match read_result {
            Ok(ReadEnd::Eof) => {
                self.transition(PipelineState::Closed);
                Ok(())
            }
            Ok(ReadEnd::Cancelled) => {
                self.transition(PipelineState::Cancelled);
                Err(HookcatError::Cancelled)
            }
            Err(e) => {
                self.transition(PipelineState::Closed);
                Err(e)
            }
        }
    }

    async fn read_input<R, W>(
        &mut self,
        mut input: R,
        mut output: W,
        cancel: &CancellationToken,
        batch: &mut String,
    ) -> HookcatResult<ReadEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            buf.clear();

            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Processing interrupted");
                    return Ok(ReadEnd::Cancelled);
                }
                read = input.read_until(b'\n', &mut buf) => read?,
            };

            if read == 0 {
                output.flush().await?;
                return Ok(ReadEnd::Eof);
            }

            let line = trim_line_ending(&buf);
            output.write_all(line).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;

            let text = String::from_utf8_lossy(line);
            if self.one_line {
                self.dispatch(text.into_owned());
            } else {
                batch.push_str(&text);
                batch.push('\n');
            }
        }
    }

    /// Split the batch buffer and dispatch each chunk. No-op in line mode.
    fn flush_batch(&mut self, batch: &str) {
        if self.one_line || self.sender.is_none() {
            return;
        }

        let chunks = split_message(batch, MAX_MESSAGE_LENGTH);
        debug!(
            bytes = batch.len(),
            chunks = chunks.len(),
            "Dispatching batched input"
        );
        for chunk in chunks {
            self.dispatch(chunk);
        }
    }

    fn dispatch(&mut self, content: String) {
        let Some(sender) = self.sender.clone() else {
            return;
        };

        self.tasks
            .spawn(async move { sender.send_with_retry(&content).await });
        debug!(outstanding = self.tasks.len(), "Delivery task dispatched");
    }

    async fn await_outstanding(&mut self) {
        debug!(outstanding = self.tasks.len(), "Waiting for outstanding deliveries");

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => debug!(?outcome, "Delivery task finished"),
                Err(e) => error!(error = %e, "Delivery task aborted"),
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
