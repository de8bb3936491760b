//! `Web3` facade: one request manager shared by every namespace.
//!
//! # Usage
//! ```rust,no_run
//! use chainweb3_core::{Web3, FnTransport};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), chainweb3_core::Web3Error> {
//! let transport = Arc::new(FnTransport::new("node", |_: &[u8]| Ok(b"{}".to_vec())));
//! let mut web3 = Web3::new(transport);
//! let balance = web3
//!     .eth()
//!     .request("getBalance", vec![json!("0x0000000000000000000000000000000000000000")])
//!     .await?;
//! # let _ = balance;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::batch::BatchResponse;
use crate::error::Web3Error;
use crate::manager::{Dispatch, ManagerConfig, RequestManager, ResponseCallback};
use crate::methods::{MethodRegistry, Namespace, CALLBACK_MESSAGE};
use crate::transport::RpcTransport;

/// Client for every namespace, routed through a single [`RequestManager`].
#[derive(Debug)]
pub struct Web3 {
    manager: RequestManager,
    registries: HashMap<Namespace, MethodRegistry>,
}

impl Web3 {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self::with_config(transport, ManagerConfig::default())
    }

    pub fn with_config(transport: Arc<dyn RpcTransport>, config: ManagerConfig) -> Self {
        Self {
            manager: RequestManager::with_config(transport, config),
            registries: HashMap::new(),
        }
    }

    pub fn manager(&self) -> &RequestManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut RequestManager {
        &mut self.manager
    }

    pub fn batch(&mut self, enabled: bool) {
        self.manager.batch(enabled);
    }

    pub fn is_batch(&self) -> bool {
        self.manager.is_batch()
    }

    pub fn namespace(&mut self, namespace: Namespace) -> NamespaceClient<'_> {
        let registry = self
            .registries
            .entry(namespace)
            .or_insert_with(|| MethodRegistry::new(namespace));
        NamespaceClient {
            registry,
            manager: &mut self.manager,
        }
    }

    pub fn web3(&mut self) -> NamespaceClient<'_> {
        self.namespace(Namespace::Web3)
    }

    pub fn net(&mut self) -> NamespaceClient<'_> {
        self.namespace(Namespace::Net)
    }

    pub fn eth(&mut self) -> NamespaceClient<'_> {
        self.namespace(Namespace::Eth)
    }

    pub fn personal(&mut self) -> NamespaceClient<'_> {
        self.namespace(Namespace::Personal)
    }

    pub fn shh(&mut self) -> NamespaceClient<'_> {
        self.namespace(Namespace::Shh)
    }

    /// See [`RequestManager::execute`].
    pub async fn execute<F>(&mut self, callback: F) -> Result<(), Web3Error>
    where
        F: FnOnce(Result<BatchResponse, Web3Error>) + Send,
    {
        self.manager.execute(callback).await
    }

    /// See [`RequestManager::execute_batch`].
    pub async fn execute_batch(&mut self) -> Result<BatchResponse, Web3Error> {
        self.manager.execute_batch().await
    }
}

/// One namespace's view of a [`Web3`] client.
#[derive(Debug)]
pub struct NamespaceClient<'a> {
    registry: &'a mut MethodRegistry,
    manager: &'a mut RequestManager,
}

impl<'a> NamespaceClient<'a> {
    pub fn namespace(&self) -> Namespace {
        self.registry.namespace()
    }

    pub fn is_batch(&self) -> bool {
        self.manager.is_batch()
    }

    /// Callback-style call.
    ///
    /// A name that is not an identifier is ignored and yields
    /// [`Dispatch::Skipped`]. Outside batch mode a callback is mandatory.
    pub async fn call(
        &mut self,
        method: &str,
        args: Vec<Value>,
        callback: Option<ResponseCallback>,
    ) -> Result<Dispatch, Web3Error> {
        let Some(rpc_method) = self.registry.resolve(method)? else {
            return Ok(Dispatch::Skipped);
        };
        if callback.is_none() && !self.manager.is_batch() {
            return Err(Web3Error::InvalidArgument(CALLBACK_MESSAGE.into()));
        }
        let prepared = rpc_method.prepare(args)?;
        Ok(self.manager.send(prepared, callback).await)
    }

    /// Future-style call returning the formatted result.
    pub async fn request(&mut self, method: &str, args: Vec<Value>) -> Result<Value, Web3Error> {
        let Some(rpc_method) = self.registry.resolve(method)? else {
            return Err(Web3Error::InvalidArgument(format!(
                "`{method}` is not a valid method name"
            )));
        };
        let prepared = rpc_method.prepare(args)?;
        self.manager.request(prepared).await
    }

    /// Method objects this namespace has built so far.
    pub fn cached_methods(&self) -> Vec<&'static str> {
        self.registry.cached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FnTransport;
    use serde_json::json;

    fn constant(result: &'static str) -> Arc<dyn RpcTransport> {
        Arc::new(FnTransport::new("const", move |body: &[u8]| {
            let req: Value = serde_json::from_slice(body)?;
            Ok(serde_json::to_vec(&json!({"jsonrpc": "2.0", "id": req["id"], "result": result}))?)
        }))
    }

    #[tokio::test]
    async fn callback_required_outside_batch() {
        let mut web3 = Web3::new(constant("1"));
        let err = web3.net().call("version", vec![], None).await.unwrap_err();
        assert_eq!(err, Web3Error::InvalidArgument(CALLBACK_MESSAGE.into()));
    }

    #[tokio::test]
    async fn callback_optional_while_batching() {
        let mut web3 = Web3::new(constant("1"));
        web3.batch(true);
        let dispatch = web3.net().call("version", vec![], None).await.unwrap();
        assert_eq!(dispatch, Dispatch::Queued { id: 1 });
    }

    #[tokio::test]
    async fn invalid_identifier_is_skipped() {
        let mut web3 = Web3::new(constant("1"));
        let dispatch = web3.eth().call("invalid-method", vec![], None).await.unwrap();
        assert_eq!(dispatch, Dispatch::Skipped);
        assert_eq!(web3.manager().pending_count(), 0);
    }

    #[tokio::test]
    async fn namespaces_share_one_manager() {
        let mut web3 = Web3::new(constant("0x10"));
        assert_eq!(web3.net().request("peerCount", vec![]).await.unwrap(), json!(16));
        assert_eq!(web3.eth().request("blockNumber", vec![]).await.unwrap(), json!(16));
        assert_eq!(web3.eth().cached_methods(), vec!["blockNumber"]);
        assert!(web3.personal().cached_methods().is_empty());
    }
}
