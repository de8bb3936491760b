//! Contract bindings built from a JSON ABI.
//!
//! A [`Contract`] indexes the ABI's functions (overloads selected by argument
//! count), constructor, fallback and events, and turns named calls into call
//! data. [`Contract::call`] runs `eth_call` through an `eth` namespace client
//! and decodes the reply against the function's outputs.

use std::collections::HashMap;

use chainweb3_core::validators::{is_address, is_block_tag, is_hex};
use chainweb3_core::{Namespace, NamespaceClient};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::codec::AbiCodec;
use crate::decoder;
use crate::encoder;
use crate::error::AbiError;
use crate::types::{BaseType, SolidityType};
use crate::value::{decode_hex, AbiValue};

/// What an ABI entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Function,
    Constructor,
    Event,
    Fallback,
}

/// One input or output of an ABI entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiParam {
    pub name: String,
    pub ty: SolidityType,
    /// Only meaningful for event inputs.
    pub indexed: bool,
}

impl AbiParam {
    fn from_json(value: &Value) -> Result<Self, AbiError> {
        let obj = value
            .as_object()
            .ok_or_else(|| AbiError::InvalidArgument(format!("ABI parameter must be an object: {value}")))?;
        let ty = match obj.get("type") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(AbiError::InvalidArgument(format!(
                    "ABI parameter type must be a string, got {other}"
                )))
            }
            None => return Err(AbiError::InvalidArgument("ABI parameter has no type".into())),
        };
        let ty = match ty.strip_prefix("tuple") {
            Some(suffix) => {
                let components = obj
                    .get("components")
                    .and_then(Value::as_array)
                    .ok_or_else(|| AbiError::InvalidArgument(format!("{ty} has no components")))?
                    .iter()
                    .map(|c| Self::from_json(c).map(|p| p.ty))
                    .collect::<Result<Vec<_>, _>>()?;
                let tuple = SolidityType::new(BaseType::Tuple(components));
                SolidityType::parse(&format!("{tuple}{suffix}"))?
            }
            None => SolidityType::parse(ty)?,
        };
        Ok(Self {
            name: str_field(obj, "name").unwrap_or_default().to_string(),
            ty,
            indexed: obj.get("indexed").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

/// One entry of a JSON ABI.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiEntry {
    pub kind: EntryKind,
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
}

impl AbiEntry {
    /// Canonical `name(type,...)` signature.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn input_types(&self) -> Vec<SolidityType> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<SolidityType> {
        self.outputs.iter().map(|p| p.ty.clone()).collect()
    }

    fn from_json(value: &Value) -> Result<Option<Self>, AbiError> {
        let obj = value
            .as_object()
            .ok_or_else(|| AbiError::InvalidArgument(format!("ABI entry must be an object: {value}")))?;
        let kind = match str_field(obj, "type").unwrap_or("function") {
            "function" => EntryKind::Function,
            "constructor" => EntryKind::Constructor,
            "event" => EntryKind::Event,
            "fallback" => EntryKind::Fallback,
            // errors and receive() carry no call data of their own
            _ => return Ok(None),
        };
        let params = |key: &str| -> Result<Vec<AbiParam>, AbiError> {
            obj.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().map(AbiParam::from_json).collect())
                .unwrap_or_else(|| Ok(Vec::new()))
        };
        Ok(Some(Self {
            kind,
            name: str_field(obj, "name").unwrap_or_default().to_string(),
            inputs: params("inputs")?,
            outputs: params("outputs")?,
        }))
    }
}

/// A contract interface, optionally bound to an address and bytecode.
#[derive(Debug, Clone)]
pub struct Contract {
    codec: AbiCodec,
    functions: HashMap<String, Vec<AbiEntry>>,
    constructor: Option<AbiEntry>,
    fallback: Option<AbiEntry>,
    events: HashMap<String, AbiEntry>,
    address: Option<String>,
    bytecode: Option<String>,
    default_block: String,
}

impl Contract {
    /// Parse a JSON ABI given as a string.
    pub fn from_abi_json(abi: &str) -> Result<Self, AbiError> {
        let value: Value = serde_json::from_str(abi)
            .map_err(|e| AbiError::InvalidArgument(format!("invalid ABI JSON: {e}")))?;
        Self::from_abi(&value)
    }

    /// Build from an already-parsed JSON ABI array.
    pub fn from_abi(abi: &Value) -> Result<Self, AbiError> {
        let entries = abi
            .as_array()
            .ok_or_else(|| AbiError::InvalidArgument("ABI must be a JSON array".into()))?;

        let mut contract = Self {
            codec: AbiCodec::new(),
            functions: HashMap::new(),
            constructor: None,
            fallback: None,
            events: HashMap::new(),
            address: None,
            bytecode: None,
            default_block: "latest".to_string(),
        };
        for entry in entries {
            let Some(entry) = AbiEntry::from_json(entry)? else {
                continue;
            };
            match entry.kind {
                EntryKind::Function => contract
                    .functions
                    .entry(entry.name.clone())
                    .or_default()
                    .push(entry),
                EntryKind::Constructor => contract.constructor = Some(entry),
                EntryKind::Fallback => contract.fallback = Some(entry),
                EntryKind::Event => {
                    contract.events.insert(entry.name.clone(), entry);
                }
            }
        }
        debug!(
            functions = contract.functions.len(),
            events = contract.events.len(),
            "parsed contract ABI"
        );
        Ok(contract)
    }

    /// Bind to a deployed address. The address is stored lower-cased.
    pub fn at(mut self, address: &str) -> Result<Self, AbiError> {
        if !is_address(address) {
            return Err(AbiError::InvalidArgument(format!(
                "invalid contract address: {address}"
            )));
        }
        self.address = Some(address.to_ascii_lowercase());
        Ok(self)
    }

    /// Attach deployment bytecode, `0x` prefix optional.
    pub fn bytecode(mut self, code: &str) -> Result<Self, AbiError> {
        let normalized = if code.starts_with("0x") || code.starts_with("0X") {
            format!("0x{}", &code[2..])
        } else {
            format!("0x{code}")
        };
        if normalized.len() <= 2 || !is_hex(&normalized) {
            return Err(AbiError::InvalidArgument(format!("invalid bytecode: {code}")));
        }
        self.bytecode = Some(normalized);
        Ok(self)
    }

    /// Block tag used by [`Contract::call`]. Anything that is not a valid
    /// tag or quantity falls back to `latest`.
    pub fn default_block(mut self, block: &str) -> Self {
        if is_block_tag(&Value::String(block.to_string())) {
            self.default_block = block.to_string();
        } else {
            warn!(block, "invalid default block, using latest");
            self.default_block = "latest".to_string();
        }
        self
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn get_bytecode(&self) -> Option<&str> {
        self.bytecode.as_deref()
    }

    pub fn get_default_block(&self) -> &str {
        &self.default_block
    }

    pub fn constructor(&self) -> Option<&AbiEntry> {
        self.constructor.as_ref()
    }

    pub fn fallback(&self) -> Option<&AbiEntry> {
        self.fallback.as_ref()
    }

    pub fn event(&self, name: &str) -> Option<&AbiEntry> {
        self.events.get(name)
    }

    /// All overloads of `name`.
    pub fn overloads(&self, name: &str) -> &[AbiEntry] {
        self.functions.get(name).map_or(&[], Vec::as_slice)
    }

    /// The overload of `name` taking `argc` arguments.
    pub fn function(&self, name: &str, argc: usize) -> Result<&AbiEntry, AbiError> {
        let overloads = self.functions.get(name).ok_or_else(|| {
            AbiError::InvalidArgument(format!(
                "function {name} not found, please make sure the method exists"
            ))
        })?;
        overloads
            .iter()
            .find(|f| f.inputs.len() == argc)
            .ok_or_else(|| {
                AbiError::InvalidArgument(format!(
                    "no overload of {name} takes {argc} arguments"
                ))
            })
    }

    /// Call data for `name` from typed values: selector followed by the
    /// encoded arguments.
    pub fn encode_call(&self, name: &str, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let entry = self.function(name, args.len())?;
        let mut data = self.codec.selector_bytes(&entry.signature())?.to_vec();
        data.extend(encoder::encode(&entry.input_types(), args)?);
        Ok(data)
    }

    /// `0x`-prefixed call data for `name` from loose JSON arguments.
    pub fn get_data(&self, name: &str, args: &[Value]) -> Result<String, AbiError> {
        let entry = self.function(name, args.len())?;
        let values = values_from_json(&entry.input_types(), args)?;
        let mut data = self.codec.selector_bytes(&entry.signature())?.to_vec();
        data.extend(encoder::encode(&entry.input_types(), &values)?);
        Ok(format!("0x{}", hex::encode(data)))
    }

    /// Deployment data: bytecode followed by the encoded constructor arguments.
    pub fn deploy_data(&self, args: &[Value]) -> Result<String, AbiError> {
        let bytecode = self
            .bytecode
            .as_deref()
            .ok_or_else(|| AbiError::InvalidArgument("contract has no bytecode".into()))?;
        let types = self
            .constructor
            .as_ref()
            .map(AbiEntry::input_types)
            .unwrap_or_default();
        let values = values_from_json(&types, args)?;
        Ok(format!("{bytecode}{}", hex::encode(encoder::encode(&types, &values)?)))
    }

    /// Decode the return data of `name` against its first overload's outputs.
    pub fn decode_output(&self, name: &str, data: &str) -> Result<Vec<AbiValue>, AbiError> {
        let entry = self
            .overloads(name)
            .first()
            .ok_or_else(|| {
                AbiError::InvalidArgument(format!(
                    "function {name} not found, please make sure the method exists"
                ))
            })?;
        decoder::decode(&entry.output_types(), &decode_hex(data)?)
    }

    /// Find the function a call data blob invokes and decode its arguments.
    pub fn decode_input(&self, data: &str) -> Result<(&AbiEntry, Vec<AbiValue>), AbiError> {
        let bytes = decode_hex(data)?;
        let (selector, args) = bytes
            .split_first_chunk::<4>()
            .ok_or_else(|| AbiError::Codec("call data shorter than a selector".into()))?;
        for entry in self.functions.values().flatten() {
            if self.codec.selector_bytes(&entry.signature())? == *selector {
                return Ok((entry, decoder::decode(&entry.input_types(), args)?));
            }
        }
        Err(AbiError::InvalidArgument(format!(
            "no function matches selector 0x{}",
            hex::encode(selector)
        )))
    }

    /// Topic hash of event `name`.
    pub fn event_topic(&self, name: &str) -> Result<String, AbiError> {
        let event = self
            .events
            .get(name)
            .ok_or_else(|| AbiError::InvalidArgument(format!("event {name} not found")))?;
        self.codec.event_topic(&event.signature())
    }

    /// Run `eth_call` for `name` at the default block and decode the result.
    pub async fn call(
        &self,
        eth: &mut NamespaceClient<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<AbiValue>, AbiError> {
        require_eth(eth)?;
        let entry = self.function(name, args.len())?;
        let call = self.call_object(name, args, None)?;
        let result = eth
            .request("call", vec![call, Value::String(self.default_block.clone())])
            .await
            .map_err(|e| {
                warn!(function = %entry.signature(), error = %e, "eth_call failed");
                AbiError::Rpc(e)
            })?;
        let data = result
            .as_str()
            .ok_or_else(|| AbiError::Codec(format!("eth_call returned a non-string result: {result}")))?;
        decoder::decode(&entry.output_types(), &decode_hex(data)?)
    }

    /// Submit a transaction invoking `name` from `from`; returns the hash.
    pub async fn send(
        &self,
        eth: &mut NamespaceClient<'_>,
        from: &str,
        name: &str,
        args: &[Value],
    ) -> Result<Value, AbiError> {
        require_eth(eth)?;
        let tx = self.call_object(name, args, Some(from))?;
        Ok(eth.request("sendTransaction", vec![tx]).await?)
    }

    /// Gas estimate for invoking `name`.
    pub async fn estimate_gas(
        &self,
        eth: &mut NamespaceClient<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, AbiError> {
        require_eth(eth)?;
        let call = self.call_object(name, args, None)?;
        Ok(eth.request("estimateGas", vec![call]).await?)
    }

    fn call_object(&self, name: &str, args: &[Value], from: Option<&str>) -> Result<Value, AbiError> {
        let to = self
            .address
            .as_deref()
            .ok_or_else(|| AbiError::InvalidArgument("contract is not bound to an address".into()))?;
        let mut call = json!({ "to": to, "data": self.get_data(name, args)? });
        if let (Some(from), Some(obj)) = (from, call.as_object_mut()) {
            obj.insert("from".into(), Value::String(from.to_string()));
        }
        Ok(call)
    }
}

fn values_from_json(types: &[SolidityType], args: &[Value]) -> Result<Vec<AbiValue>, AbiError> {
    if types.len() != args.len() {
        return Err(AbiError::InvalidArgument(format!(
            "expected {} arguments, got {}",
            types.len(),
            args.len()
        )));
    }
    types
        .iter()
        .zip(args)
        .map(|(ty, arg)| AbiValue::from_json(ty, arg))
        .collect()
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn require_eth(eth: &NamespaceClient<'_>) -> Result<(), AbiError> {
    if eth.namespace() == Namespace::Eth {
        Ok(())
    } else {
        Err(AbiError::InvalidArgument(format!(
            "contract calls need the eth namespace, got {}",
            eth.namespace()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20: &str = r#"[
        {"type":"constructor","inputs":[{"name":"supply","type":"uint256"}]},
        {"type":"function","name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"owner","type":"address"}],
         "outputs":[{"name":"","type":"uint256"}]},
        {"type":"function","name":"transfer",
         "inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"transfer",
         "inputs":[{"name":"to","type":"address"}],
         "outputs":[]},
        {"type":"event","name":"Transfer","anonymous":false,
         "inputs":[{"name":"from","type":"address","indexed":true},
                   {"name":"to","type":"address","indexed":true},
                   {"name":"value","type":"uint256","indexed":false}]},
        {"type":"error","name":"Insufficient","inputs":[]},
        {"type":"fallback"}
    ]"#;

    fn erc20() -> Contract {
        Contract::from_abi_json(ERC20).unwrap()
    }

    #[test]
    fn entries_are_indexed_by_kind() {
        let c = erc20();
        assert_eq!(c.overloads("transfer").len(), 2);
        assert!(c.constructor().is_some());
        assert!(c.fallback().is_some());
        assert!(c.event("Transfer").unwrap().inputs[0].indexed);
        assert!(c.overloads("Insufficient").is_empty());
    }

    #[test]
    fn overload_selected_by_argument_count() {
        let c = erc20();
        assert_eq!(c.function("transfer", 2).unwrap().signature(), "transfer(address,uint256)");
        assert_eq!(c.function("transfer", 1).unwrap().signature(), "transfer(address)");
        assert!(c.function("transfer", 3).is_err());
        let err = c.function("mint", 1).unwrap_err();
        assert!(err.to_string().contains("please make sure the method exists"));
    }

    #[test]
    fn tuple_parameters_keep_array_suffix() {
        let abi = json!([{
            "type": "function",
            "name": "route",
            "inputs": [{
                "name": "legs",
                "type": "tuple[]",
                "components": [
                    {"name": "pool", "type": "address"},
                    {"name": "fee", "type": "uint24"}
                ]
            }]
        }]);
        let c = Contract::from_abi(&abi).unwrap();
        assert_eq!(c.function("route", 1).unwrap().signature(), "route((address,uint24)[])");
    }

    #[test]
    fn non_string_parameter_type_is_invalid_argument() {
        let abi = json!([{"type": "function", "name": "f", "inputs": [{"name": "x", "type": 7}]}]);
        assert!(matches!(Contract::from_abi(&abi), Err(AbiError::InvalidArgument(_))));
    }

    #[test]
    fn binding_is_validated() {
        let addr = format!("0x{}", "AB".repeat(20));
        let c = erc20().at(&addr).unwrap();
        assert_eq!(c.address(), Some(format!("0x{}", "ab".repeat(20)).as_str()));
        assert!(erc20().at("0x1234").is_err());
        assert!(erc20().bytecode("zz").is_err());
        assert_eq!(erc20().bytecode("6060").unwrap().get_bytecode(), Some("0x6060"));
        assert_eq!(erc20().default_block("pending").get_default_block(), "pending");
        assert_eq!(erc20().default_block("0x10").get_default_block(), "0x10");
        assert_eq!(erc20().default_block("yesterday").get_default_block(), "latest");
    }

    #[test]
    fn call_data_and_input_decoding() {
        let c = erc20();
        let to = format!("0x{}", "11".repeat(20));
        let data = c.get_data("transfer", &[json!(to), json!(1000)]).unwrap();
        assert!(data.starts_with("0xa9059cbb"));
        assert_eq!(data.len(), 2 + 8 + 128);

        let (entry, args) = c.decode_input(&data).unwrap();
        assert_eq!(entry.signature(), "transfer(address,uint256)");
        assert_eq!(args[1], AbiValue::from(1000u64));
    }

    #[test]
    fn deploy_data_appends_constructor_args() {
        let c = erc20().bytecode("0x6080").unwrap();
        let data = c.deploy_data(&[json!(5)]).unwrap();
        assert_eq!(data, format!("0x6080{:064x}", 5));
        assert!(erc20().deploy_data(&[json!(5)]).is_err());
    }

    #[test]
    fn output_and_topic() {
        let c = erc20();
        let ret = format!("0x{:064x}", 42);
        assert_eq!(c.decode_output("balanceOf", &ret).unwrap(), vec![AbiValue::from(42u64)]);
        assert_eq!(
            c.event_topic("Transfer").unwrap(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }
}
