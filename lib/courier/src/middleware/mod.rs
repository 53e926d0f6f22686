//! Tower middleware layers for the HTTP transport.
//!
//! Layers wrap [`HyperClient`](crate::HyperClient) through
//! [`HyperClientBuilder::layer`](crate::HyperClientBuilder::layer) or the
//! feature-gated helpers:
//!
//! | Feature | Helper |
//! |---------|--------|
//! | `middleware-retry` | `.with_retry(n)` |
//! | `middleware-logging` | `.with_logging()`, `.with_debug_logging()` |
//! | `middleware-auth` | `.with_token_auth(t)`, `.with_bearer_auth(t)` |
//! | `middleware-concurrency` | `.with_concurrency_limit(n)` |
//! | `middleware-core` | all of the above (default) |
//!
//! The invoker never retries: a failure reaches the descriptor's fallback
//! exactly once, after whatever the transport stack decided to do.

mod auth;
mod logging;
mod retry;

pub use auth::{AuthHeader, AuthHeaderLayer, AuthScheme};
pub use logging::{LogLevel, Logging, LoggingLayer};
pub use retry::RetryPolicy;

pub use tower::{Layer, ServiceBuilder};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::retry::RetryLayer;
