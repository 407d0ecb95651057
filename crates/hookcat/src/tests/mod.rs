//! Scenario tests for the delivery pipeline.
//!
//! - `harness.rs`        - scripted transport and pipeline builders
//! - `batch_mode.rs`     - buffered input, chunking, echo behavior
//! - `line_mode.rs`      - per-line dispatch
//! - `cancellation.rs`   - shutdown signal handling and draining
//! - `http_transport.rs` - reqwest transport against a mock webhook
