//! Method registry: per-namespace allow-lists of RPC methods.
//!
//! Every namespace has a static table of [`MethodSpec`]s (see [`tables`]).
//! A [`MethodRegistry`] resolves a bare method name against its namespace's
//! table, builds an [`RpcMethod`] on first use and caches it by name.

pub mod tables;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::error::Web3Error;
use crate::formatters::{InputFormatter, OutputFormatter};
use crate::manager::PreparedCall;
use crate::validators::ParamValidator;

/// Message used when a call carries more arguments than the method accepts.
pub const CALLBACK_MESSAGE: &str = "the last param must be a callback function";

/// RPC namespaces a client can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Web3,
    Net,
    Eth,
    Personal,
    Shh,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Web3,
        Namespace::Net,
        Namespace::Eth,
        Namespace::Personal,
        Namespace::Shh,
    ];

    /// Prefix joined to a method name with `_` to form the RPC name.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Web3 => "web3",
            Self::Net => "net",
            Self::Eth => "eth",
            Self::Personal => "personal",
            Self::Shh => "shh",
        }
    }

    /// The namespace's allow-list.
    pub fn methods(self) -> &'static [MethodSpec] {
        match self {
            Self::Web3 => tables::WEB3,
            Self::Net => tables::NET,
            Self::Eth => tables::ETH,
            Self::Personal => tables::PERSONAL,
            Self::Shh => tables::SHH,
        }
    }

    pub fn rpc_name(self, method: &str) -> String {
        format!("{}_{}", self.prefix(), method)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// One positional parameter of a method.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub validator: ParamValidator,
    pub formatter: InputFormatter,
    /// Value used when the caller omits this trailing parameter.
    pub default: Option<fn() -> Value>,
}

impl Param {
    pub const fn new(name: &'static str, validator: ParamValidator, formatter: InputFormatter) -> Self {
        Self {
            name,
            validator,
            formatter,
            default: None,
        }
    }

    pub const fn or(mut self, default: fn() -> Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Static description of one allowed method.
#[derive(Debug, Clone, Copy)]
pub struct MethodSpec {
    pub name: &'static str,
    pub params: &'static [Param],
    pub output: OutputFormatter,
}

impl MethodSpec {
    pub const fn new(name: &'static str, params: &'static [Param], output: OutputFormatter) -> Self {
        Self { name, params, output }
    }

    /// Number of parameters the caller must supply.
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1)
    }
}

/// A resolved, reusable method object.
#[derive(Debug)]
pub struct RpcMethod {
    rpc_name: String,
    spec: &'static MethodSpec,
}

impl RpcMethod {
    fn new(namespace: Namespace, spec: &'static MethodSpec) -> Self {
        Self {
            rpc_name: namespace.rpc_name(spec.name),
            spec,
        }
    }

    /// Full wire name, e.g. `eth_getBalance`.
    pub fn rpc_name(&self) -> &str {
        &self.rpc_name
    }

    pub fn spec(&self) -> &'static MethodSpec {
        self.spec
    }

    /// Validate then format `args` into a call ready for dispatch.
    ///
    /// Omitted trailing parameters take their defaults. Every validator runs
    /// before any formatter, so a rejected call never reaches the manager.
    pub fn prepare(&self, mut args: Vec<Value>) -> Result<PreparedCall, Web3Error> {
        let params = self.spec.params;
        if args.len() > params.len() {
            return Err(Web3Error::InvalidArgument(CALLBACK_MESSAGE.into()));
        }
        if args.len() < self.spec.required_params() {
            return Err(Web3Error::InvalidArgument(format!(
                "{} expects at least {} parameters, got {}",
                self.rpc_name,
                self.spec.required_params(),
                args.len()
            )));
        }
        for param in &params[args.len()..] {
            if let Some(default) = param.default {
                args.push(default());
            }
        }

        for (index, (param, value)) in params.iter().zip(&args).enumerate() {
            if !param.validator.check(value) {
                return Err(Web3Error::Validation {
                    method: self.rpc_name.clone(),
                    index,
                    param: param.name.into(),
                });
            }
        }

        let formatted = params
            .iter()
            .zip(args)
            .map(|(param, value)| param.formatter.apply(value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PreparedCall::new(self.rpc_name.clone(), formatted).with_output(self.spec.output))
    }
}

/// Returns `true` if `name` can name a method at all.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Allow-list lookup plus a per-name cache of method objects.
#[derive(Debug)]
pub struct MethodRegistry {
    namespace: Namespace,
    cache: HashMap<&'static str, Arc<RpcMethod>>,
}

impl MethodRegistry {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            cache: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Resolve `name` to its method object.
    ///
    /// Returns `Ok(None)` when `name` is not an identifier; such calls are
    /// silently ignored. A well-formed name missing from the allow-list is
    /// [`Web3Error::UnsupportedMethod`] carrying the full RPC name.
    pub fn resolve(&mut self, name: &str) -> Result<Option<Arc<RpcMethod>>, Web3Error> {
        if !is_identifier(name) {
            return Ok(None);
        }
        if let Some(method) = self.cache.get(name) {
            return Ok(Some(Arc::clone(method)));
        }
        let spec = self
            .namespace
            .methods()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| Web3Error::UnsupportedMethod {
                method: self.namespace.rpc_name(name),
            })?;
        let method = Arc::new(RpcMethod::new(self.namespace, spec));
        trace!(method = method.rpc_name(), "cached method object");
        self.cache.insert(spec.name, Arc::clone(&method));
        Ok(Some(method))
    }

    /// Resolve `name` and prepare a call from `args`.
    pub fn prepare(&mut self, name: &str, args: Vec<Value>) -> Result<Option<PreparedCall>, Web3Error> {
        match self.resolve(name)? {
            Some(method) => method.prepare(args).map(Some),
            None => Ok(None),
        }
    }

    /// Names of the method objects built so far.
    pub fn cached(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.cache.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
