//! chainweb3-http: HTTP transport for ChainWeb3.
//!
//! [`HttpTransport`] implements [`chainweb3_core::RpcTransport`] over
//! `reqwest`, retrying transient failures (connection errors, timeouts,
//! 429 and 5xx replies) per a [`RetryConfig`], honouring `Retry-After`.

pub mod client;
pub mod retry;

pub use client::{HttpTransport, HttpTransportConfig};
pub use retry::{RetryConfig, RetryPolicy};
