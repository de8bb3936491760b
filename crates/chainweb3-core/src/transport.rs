//! The `RpcTransport` trait: the byte-level seam to the network.
//!
//! The request manager serializes JSON-RPC messages itself and hands the
//! transport an opaque body; the transport returns the raw reply body.
//! Synchronous transports are adapted with [`FnTransport`].

use async_trait::async_trait;

use crate::error::TransportError;

/// The central async trait every RPC transport must implement.
///
/// One call to [`send_raw`](RpcTransport::send_raw) is one wire message: a
/// single request object, or a JSON array when a batch is flushed. Retry
/// policy, if any, lives inside the implementation.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send one serialized JSON-RPC message and return the raw reply body.
    async fn send_raw(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError>;

    /// Return the transport's identifier (URL or name).
    fn url(&self) -> &str;
}

/// Adapts a synchronous closure into an [`RpcTransport`].
///
/// ```rust
/// use chainweb3_core::transport::FnTransport;
///
/// let echo = FnTransport::new("echo", |body: &[u8]| Ok(body.to_vec()));
/// # let _ = echo;
/// ```
pub struct FnTransport<F> {
    name: String,
    f: F,
}

impl<F> FnTransport<F>
where
    F: Fn(&[u8]) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> RpcTransport for FnTransport<F>
where
    F: Fn(&[u8]) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
{
    async fn send_raw(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        (self.f)(&payload)
    }

    fn url(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn fn_transport_passes_bytes_through() {
        let t: Arc<dyn RpcTransport> =
            Arc::new(FnTransport::new("mock", |body: &[u8]| Ok(body.iter().rev().copied().collect())));
        let out = t.send_raw(vec![1, 2, 3]).await.unwrap();
        assert_eq!(out, vec![3, 2, 1]);
        assert_eq!(t.url(), "mock");
    }

    #[tokio::test]
    async fn fn_transport_propagates_failure() {
        let t = FnTransport::new("down", |_: &[u8]| Err(TransportError::Http("refused".into())));
        let err = t.send_raw(vec![]).await.unwrap_err();
        assert_eq!(err, TransportError::Http("refused".into()));
    }
}
