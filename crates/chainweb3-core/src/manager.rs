//! Request manager: id allocation, batching, and response demultiplexing.
//!
//! A manager owns one transport. Outside batch mode every call is one wire
//! message. Between `batch(true)` and `execute` calls are queued in an
//! envelope and flushed as a single JSON array; replies are matched back to
//! their requests by id, never by position.
//!
//! # Usage
//! ```rust,no_run
//! use chainweb3_core::manager::{PreparedCall, RequestManager};
//! use chainweb3_core::transport::RpcTransport;
//! use std::sync::Arc;
//!
//! # async fn demo(transport: Arc<dyn RpcTransport>) -> Result<(), chainweb3_core::Web3Error> {
//! let mut manager = RequestManager::new(transport);
//! let block = manager.request(PreparedCall::new("eth_blockNumber", vec![])).await?;
//!
//! manager.batch(true);
//! manager.send(PreparedCall::new("net_version", vec![]), None).await;
//! manager.send(PreparedCall::new("eth_gasPrice", vec![]), None).await;
//! let batch = manager.execute_batch().await?;
//! # let _ = (block, batch);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::batch::BatchResponse;
use crate::error::{TransportError, Web3Error};
use crate::formatters::OutputFormatter;
use crate::request::{decode_batch, decode_response, BatchReply, JsonRpcRequest};
use crate::transport::RpcTransport;

/// Invoked exactly once with the formatted outcome of one call.
pub type ResponseCallback = Box<dyn FnOnce(Result<Value, Web3Error>) + Send>;

/// Configuration for a [`RequestManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Id given to the first request.
    pub first_id: u64,
    /// Deadline applied by [`RequestManager::request`]; `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            first_id: 1,
            request_timeout: None,
        }
    }
}

/// A validated, formatted call ready to be put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub method: String,
    pub params: Vec<Value>,
    pub output: OutputFormatter,
}

impl PreparedCall {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
            output: OutputFormatter::Raw,
        }
    }

    pub fn with_output(mut self, output: OutputFormatter) -> Self {
        self.output = output;
        self
    }
}

/// A call awaiting its response.
pub struct PendingCall {
    pub id: u64,
    callback: Option<ResponseCallback>,
    output: OutputFormatter,
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("id", &self.id)
            .field("has_callback", &self.callback.is_some())
            .field("output", &self.output)
            .finish()
    }
}

/// What `send` did with a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Sent on its own; the callback has already run.
    Completed { id: u64 },
    /// Queued in the batch envelope until `execute`.
    Queued { id: u64 },
    /// Nothing was sent (the method name was not a valid identifier).
    Skipped,
}

/// Owns id allocation, the batch envelope and the pending-call table.
///
/// Access is single-threaded by construction: every dispatching method
/// takes `&mut self`.
pub struct RequestManager {
    transport: Arc<dyn RpcTransport>,
    config: ManagerConfig,
    next_id: u64,
    is_batch: bool,
    envelope: Vec<JsonRpcRequest>,
    pending: HashMap<u64, PendingCall>,
}

impl RequestManager {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self::with_config(transport, ManagerConfig::default())
    }

    pub fn with_config(transport: Arc<dyn RpcTransport>, config: ManagerConfig) -> Self {
        Self {
            transport,
            next_id: config.first_id,
            config,
            is_batch: false,
            envelope: Vec::new(),
            pending: HashMap::new(),
        }
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Enable or disable batch mode.
    ///
    /// Disabling discards anything queued since batching was enabled; the
    /// discarded callbacks are never invoked.
    pub fn batch(&mut self, enabled: bool) {
        if !enabled && !self.envelope.is_empty() {
            warn!(dropped = self.envelope.len(), "batch disabled with queued requests");
            for req in self.envelope.drain(..) {
                self.pending.remove(&req.id);
            }
        }
        self.is_batch = enabled;
    }

    pub fn is_batch(&self) -> bool {
        self.is_batch
    }

    /// Number of requests queued or in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Send `call`, or queue it while batching.
    ///
    /// Outside batch mode `callback` receives the formatted outcome exactly
    /// once before this returns. In batch mode nothing is invoked until
    /// [`execute`](Self::execute); a `None` callback simply discards the slot.
    pub async fn send(&mut self, call: PreparedCall, callback: Option<ResponseCallback>) -> Dispatch {
        if self.is_batch {
            let id = self.enqueue(call, callback);
            return Dispatch::Queued { id };
        }
        let id = self.peek_id();
        let _ = self.dispatch_one(call, callback).await;
        Dispatch::Completed { id }
    }

    /// Send `call` on its own and return the formatted result.
    ///
    /// Applies [`ManagerConfig::request_timeout`] when set.
    pub async fn request(&mut self, call: PreparedCall) -> Result<Value, Web3Error> {
        match self.config.request_timeout {
            Some(deadline) => self.request_with_deadline(call, deadline).await,
            None => self.request_now(call).await,
        }
    }

    /// Like [`request`](Self::request) with an explicit deadline.
    ///
    /// On expiry the call is dropped from the pending table and
    /// `TransportError::Timeout` is returned.
    pub async fn request_with_deadline(
        &mut self,
        call: PreparedCall,
        deadline: Duration,
    ) -> Result<Value, Web3Error> {
        let id = self.peek_id();
        match tokio::time::timeout(deadline, self.request_now(call)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.pending.remove(&id);
                warn!(id, timeout_ms = deadline.as_millis() as u64, "request abandoned");
                Err(TransportError::Timeout {
                    ms: deadline.as_millis() as u64,
                }
                .into())
            }
        }
    }

    /// Flush the batch envelope and hand the outcome to `callback`.
    ///
    /// Fails with [`Web3Error::State`] without invoking `callback` when
    /// batching is off or nothing is queued. Batch mode is cleared before
    /// the flush.
    pub async fn execute<F>(&mut self, callback: F) -> Result<(), Web3Error>
    where
        F: FnOnce(Result<BatchResponse, Web3Error>) + Send,
    {
        self.ensure_batch_ready()?;
        self.is_batch = false;
        let outcome = self.flush().await;
        callback(outcome);
        Ok(())
    }

    /// Flush the batch envelope and return its positional outcome.
    pub async fn execute_batch(&mut self) -> Result<BatchResponse, Web3Error> {
        self.ensure_batch_ready()?;
        self.is_batch = false;
        self.flush().await
    }

    fn ensure_batch_ready(&self) -> Result<(), Web3Error> {
        if !self.is_batch {
            return Err(Web3Error::State("batch mode is not enabled".into()));
        }
        if self.envelope.is_empty() {
            return Err(Web3Error::State("no requests queued in the batch".into()));
        }
        Ok(())
    }

    fn peek_id(&mut self) -> u64 {
        while self.pending.contains_key(&self.next_id) {
            self.next_id = self.next_id.wrapping_add(1);
        }
        self.next_id
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.peek_id();
        self.next_id = id.wrapping_add(1);
        id
    }

    fn enqueue(&mut self, call: PreparedCall, callback: Option<ResponseCallback>) -> u64 {
        let id = self.allocate_id();
        debug!(method = %call.method, id, queued = self.envelope.len() + 1, "queued batch request");
        self.pending.insert(
            id,
            PendingCall {
                id,
                callback,
                output: call.output,
            },
        );
        self.envelope.push(JsonRpcRequest::new(id, call.method, call.params));
        id
    }

    async fn request_now(&mut self, call: PreparedCall) -> Result<Value, Web3Error> {
        if self.is_batch {
            return Err(Web3Error::State(
                "cannot await a single request while batching".into(),
            ));
        }
        self.dispatch_one(call, None).await
    }

    async fn dispatch_one(
        &mut self,
        call: PreparedCall,
        callback: Option<ResponseCallback>,
    ) -> Result<Value, Web3Error> {
        let id = self.allocate_id();
        self.pending.insert(
            id,
            PendingCall {
                id,
                callback,
                output: call.output,
            },
        );
        let request = JsonRpcRequest::new(id, call.method, call.params);
        let transport = Arc::clone(&self.transport);
        let outcome = round_trip(transport.as_ref(), &request).await;

        let Some(pending) = self.pending.remove(&id) else {
            return outcome;
        };
        let outcome = outcome.and_then(|v| pending.output.apply(v));
        if let Some(callback) = pending.callback {
            callback(outcome.clone());
        }
        outcome
    }

    async fn flush(&mut self) -> Result<BatchResponse, Web3Error> {
        let envelope = std::mem::take(&mut self.envelope);
        let ids: Vec<u64> = envelope.iter().map(|r| r.id).collect();
        let transport = Arc::clone(&self.transport);
        debug!(size = envelope.len(), url = transport.url(), "flushing batch");

        let reply = match send_batch(transport.as_ref(), &envelope).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(size = ids.len(), error = %e, "batch dispatch failed");
                let err = Web3Error::from(e);
                for id in &ids {
                    if let Some(cb) = self.pending.remove(id).and_then(|p| p.callback) {
                        cb(Err(err.clone()));
                    }
                }
                return Err(err);
            }
        };

        let raw_slots: Vec<Result<Value, Web3Error>> = match reply {
            BatchReply::Rejected(err) => {
                warn!(code = err.code, message = %err.message, "node rejected batch");
                ids.iter().map(|_| Err(Web3Error::Rpc(err.clone()))).collect()
            }
            BatchReply::Responses(mut responses) => {
                responses.sort_by_key(|r| r.id.as_u64());
                ids.iter()
                    .map(|id| {
                        match responses.binary_search_by_key(&Some(*id), |r| r.id.as_u64()) {
                            Ok(pos) => responses[pos].clone().into_result().map_err(Web3Error::from),
                            Err(_) => Err(Web3Error::MissingResponse { id: *id }),
                        }
                    })
                    .collect()
            }
        };

        let mut slots = Vec::with_capacity(raw_slots.len());
        for (id, outcome) in ids.iter().zip(raw_slots) {
            let outcome = match self.pending.remove(id) {
                Some(pending) => {
                    let outcome = outcome.and_then(|v| pending.output.apply(v));
                    if let Some(cb) = pending.callback {
                        cb(outcome.clone());
                    }
                    outcome
                }
                None => outcome,
            };
            slots.push(outcome);
        }
        Ok(BatchResponse::new(slots))
    }
}

impl std::fmt::Debug for RequestManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestManager")
            .field("url", &self.transport.url())
            .field("next_id", &self.next_id)
            .field("is_batch", &self.is_batch)
            .field("queued", &self.envelope.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

async fn round_trip(
    transport: &dyn RpcTransport,
    request: &JsonRpcRequest,
) -> Result<Value, Web3Error> {
    let payload = serde_json::to_vec(request).map_err(TransportError::from)?;
    debug!(method = %request.method, id = request.id, url = transport.url(), "dispatching request");
    let raw = transport.send_raw(payload).await.map_err(|e| {
        warn!(method = %request.method, id = request.id, error = %e, "request failed");
        e
    })?;
    let response = decode_response(&raw)?;
    if response.error.is_none() && response.id.as_u64() != Some(request.id) {
        return Err(TransportError::Malformed(format!(
            "response id {} does not match request id {}",
            response.id, request.id
        ))
        .into());
    }
    Ok(response.into_result()?)
}

async fn send_batch(
    transport: &dyn RpcTransport,
    envelope: &[JsonRpcRequest],
) -> Result<BatchReply, TransportError> {
    let payload = serde_json::to_vec(envelope)?;
    let raw = transport.send_raw(payload).await?;
    decode_batch(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FnTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every request with its own method name as the result.
    fn echo_transport() -> Arc<dyn RpcTransport> {
        Arc::new(FnTransport::new("echo", |body: &[u8]| {
            let value: Value = serde_json::from_slice(body)?;
            let answer = |req: &Value| json!({"jsonrpc": "2.0", "id": req["id"], "result": req["method"]});
            let reply = match &value {
                Value::Array(reqs) => Value::Array(reqs.iter().map(answer).collect()),
                req => answer(req),
            };
            Ok(serde_json::to_vec(&reply)?)
        }))
    }

    fn recorder() -> (Arc<Mutex<Vec<Result<Value, Web3Error>>>>, impl Fn() -> ResponseCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let make = move || -> ResponseCallback {
            let sink = Arc::clone(&sink);
            Box::new(move |outcome: Result<Value, Web3Error>| sink.lock().unwrap().push(outcome))
        };
        (seen, make)
    }

    #[tokio::test]
    async fn single_send_invokes_callback_once() {
        let mut manager = RequestManager::new(echo_transport());
        let (seen, cb) = recorder();
        let dispatch = manager.send(PreparedCall::new("net_version", vec![]), Some(cb())).await;
        assert_eq!(dispatch, Dispatch::Completed { id: 1 });
        assert_eq!(*seen.lock().unwrap(), vec![Ok(json!("net_version"))]);
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let mut manager = RequestManager::new(echo_transport());
        manager.batch(true);
        let a = manager.send(PreparedCall::new("a", vec![]), None).await;
        let b = manager.send(PreparedCall::new("b", vec![]), None).await;
        assert_eq!(a, Dispatch::Queued { id: 1 });
        assert_eq!(b, Dispatch::Queued { id: 2 });
    }

    #[tokio::test]
    async fn batched_send_defers_callback_until_execute() {
        let mut manager = RequestManager::new(echo_transport());
        let (seen, cb) = recorder();
        manager.batch(true);
        manager.send(PreparedCall::new("eth_accounts", vec![]), Some(cb())).await;
        assert!(seen.lock().unwrap().is_empty());

        let batch = manager.execute_batch().await.unwrap();
        assert_eq!(batch.positional_results(), vec![json!("eth_accounts")]);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(!manager.is_batch());
    }

    #[tokio::test]
    async fn execute_without_batch_is_state_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let transport = Arc::new(FnTransport::new("count", move |_: &[u8]| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(b"[]".to_vec())
        }));
        let mut manager = RequestManager::new(transport);

        let mut invoked = false;
        let err = manager.execute(|_| invoked = true).await.unwrap_err();
        assert!(matches!(err, Web3Error::State(_)));
        assert!(!invoked);

        manager.batch(true);
        assert!(matches!(manager.execute_batch().await, Err(Web3Error::State(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_false_sets_mode_exactly() {
        let mut manager = RequestManager::new(echo_transport());
        manager.batch(false);
        assert!(!manager.is_batch());
        manager.batch(true);
        assert!(manager.is_batch());
        manager.send(PreparedCall::new("x", vec![]), None).await;
        manager.batch(false);
        assert!(!manager.is_batch());
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn request_refused_while_batching() {
        let mut manager = RequestManager::new(echo_transport());
        manager.batch(true);
        let err = manager.request(PreparedCall::new("x", vec![])).await.unwrap_err();
        assert!(matches!(err, Web3Error::State(_)));
    }

    #[tokio::test]
    async fn output_formatter_applies_to_result() {
        let transport = Arc::new(FnTransport::new("num", |body: &[u8]| {
            let req: Value = serde_json::from_slice(body)?;
            Ok(serde_json::to_vec(&json!({"jsonrpc": "2.0", "id": req["id"], "result": "0x2a"}))?)
        }));
        let mut manager = RequestManager::new(transport);
        let call = PreparedCall::new("eth_blockNumber", vec![]).with_output(OutputFormatter::Quantity);
        assert_eq!(manager.request(call).await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn mismatched_response_id_is_malformed() {
        let transport = Arc::new(FnTransport::new("wrong-id", |_: &[u8]| {
            Ok(br#"{"jsonrpc":"2.0","id":999,"result":"0x1"}"#.to_vec())
        }));
        let mut manager = RequestManager::new(transport);
        let err = manager.request(PreparedCall::new("x", vec![])).await.unwrap_err();
        assert!(matches!(err, Web3Error::Transport(TransportError::Malformed(_))));
    }

    #[tokio::test]
    async fn whole_batch_rejection_fills_every_slot() {
        let transport = Arc::new(FnTransport::new("reject", |_: &[u8]| {
            Ok(br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32600,"message":"Invalid Request"}}"#.to_vec())
        }));
        let mut manager = RequestManager::new(transport);
        manager.batch(true);
        manager.send(PreparedCall::new("a", vec![]), None).await;
        manager.send(PreparedCall::new("b", vec![]), None).await;
        let batch = manager.execute_batch().await.unwrap();
        assert_eq!(batch.failed().len(), 2);
        assert!(batch.failed().iter().all(|e| e.rpc_error().map(|r| r.code) == Some(-32600)));
    }

    #[tokio::test]
    async fn missing_batch_slot_reported() {
        let transport = Arc::new(FnTransport::new("partial", |_: &[u8]| {
            Ok(br#"[{"jsonrpc":"2.0","id":1,"result":"0x1"}]"#.to_vec())
        }));
        let mut manager = RequestManager::new(transport);
        manager.batch(true);
        manager.send(PreparedCall::new("a", vec![]), None).await;
        manager.send(PreparedCall::new("b", vec![]), None).await;
        let batch = manager.execute_batch().await.unwrap();
        assert_eq!(batch.slots()[0], Ok(json!("0x1")));
        assert_eq!(batch.slots()[1], Err(Web3Error::MissingResponse { id: 2 }));
    }

    #[tokio::test]
    async fn deadline_abandons_call() {
        struct Stalled;

        #[async_trait::async_trait]
        impl RpcTransport for Stalled {
            async fn send_raw(&self, _payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
                std::future::pending().await
            }

            fn url(&self) -> &str {
                "stalled"
            }
        }

        let mut manager = RequestManager::new(Arc::new(Stalled));
        let err = manager
            .request_with_deadline(PreparedCall::new("x", vec![]), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, Web3Error::Transport(TransportError::Timeout { ms: 50 }));
        assert_eq!(manager.pending_count(), 0);
    }
}
