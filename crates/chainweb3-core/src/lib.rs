//! chainweb3-core: JSON-RPC dispatch engine for ChainWeb3.
//!
//! # Overview
//!
//! The core crate turns named method calls into JSON-RPC 2.0 requests,
//! single or batched, and routes each reply back to its caller by id:
//!
//! - [`RpcTransport`]: the byte-level async seam every transport implements
//! - [`RequestManager`]: id allocation, batch envelope, demultiplexing
//! - [`MethodRegistry`]: per-namespace allow-lists with validators and formatters
//! - [`validators`] module: shape checks for calls, transactions, filters and posts
//! - [`Web3`]: one manager shared by the `web3`, `net`, `eth`, `personal` and `shh` namespaces
//! - [`Web3Error`] / [`TransportError`]: structured error types

pub mod batch;
pub mod error;
pub mod formatters;
pub mod manager;
pub mod methods;
pub mod request;
pub mod transport;
pub mod validators;
pub mod web3;

pub use batch::BatchResponse;
pub use error::{TransportError, Web3Error};
pub use formatters::{InputFormatter, OutputFormatter};
pub use manager::{Dispatch, ManagerConfig, PreparedCall, RequestManager, ResponseCallback};
pub use methods::{MethodRegistry, MethodSpec, Namespace, RpcMethod};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcParam};
pub use transport::{FnTransport, RpcTransport};
pub use validators::{
    CallValidator, FilterValidator, PostValidator, ShhFilterValidator, TransactionValidator,
    Validator,
};
pub use web3::{NamespaceClient, Web3};
