//! chainweb3 CLI: JSON-RPC calls and ABI encoding from the terminal.
//!
//! Usage:
//! ```bash
//! # Send a JSON-RPC call through the method registry
//! chainweb3 call --url https://cloudflare-eth.com --method eth_getBalance \
//!     --params '["0x00000000219ab540356cbb839cbe05303d7705fa"]'
//!
//! # Function selector / event topic
//! chainweb3 selector "transfer(address,uint256)"
//! chainweb3 topic "Transfer(address,address,uint256)"
//!
//! # ABI-encode and decode parameter lists
//! chainweb3 encode --types '["address","uint256"]' --values '["0x…", "1000"]'
//! chainweb3 decode --types '["uint256"]' --data 0x…
//! ```

mod logging;

use std::env;
use std::process;
use std::sync::Arc;

use serde_json::Value;

use chainweb3_abi::{AbiCodec, AbiValue};
use chainweb3_core::{Namespace, Web3};
use chainweb3_http::HttpTransport;

use logging::{init_tracing, LogConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let rest = &args[2..];
    let log_env = env::var("CHAINWEB3_LOG").ok();
    match LogConfig::from_env_and_args(log_env.as_deref(), rest) {
        Ok(config) => init_tracing(&config),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    let result = match args[1].as_str() {
        "call" => cmd_call(rest).await,
        "selector" => cmd_selector(rest),
        "topic" => cmd_topic(rest),
        "encode" => cmd_encode(rest),
        "decode" => cmd_decode(rest),
        "version" | "--version" | "-V" => Ok(format!("chainweb3 {}", env!("CARGO_PKG_VERSION"))),
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    match result {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("chainweb3 {}", env!("CARGO_PKG_VERSION"));
    println!("JSON-RPC calls and Solidity ABI encoding\n");
    println!("USAGE:");
    println!("    chainweb3 <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    call       Send a JSON-RPC call (validated against the method registry)");
    println!("    selector   Print the 4-byte selector of a function signature");
    println!("    topic      Print the 32-byte topic of an event signature");
    println!("    encode     ABI-encode values");
    println!("    decode     ABI-decode hex data");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("FLAGS:");
    println!("    --url <URL>          RPC endpoint URL (or CHAINWEB3_URL)");
    println!("    --method <NAME>      Full RPC name, e.g. eth_blockNumber");
    println!("    --params <JSON>      JSON array of call parameters  [default: []]");
    println!("    --types <JSON>       JSON array of Solidity type names");
    println!("    --values <JSON>      JSON array of values to encode");
    println!("    --data <HEX>         0x-prefixed data to decode");
    println!("    --log-level <LEVEL>  trace | debug | info | warn | error  [default: info]");
    println!("    --log-component <CRATE=LEVEL>  Per-crate level, repeatable");
    println!("    --log-json           Emit JSON log lines on stderr");
    println!("\nENVIRONMENT:");
    println!("    CHAINWEB3_URL        Default for --url");
    println!("    CHAINWEB3_LOG        JSON log config, e.g. {{\"level\":\"debug\",\"json\":true}}");
    println!("    RUST_LOG             Overrides every log level setting");
}

async fn cmd_call(args: &[String]) -> Result<String, String> {
    let url = parse_flag(args, "--url")
        .or_else(|| env::var("CHAINWEB3_URL").ok())
        .ok_or("--url is required (or set CHAINWEB3_URL)")?;
    let method = parse_flag(args, "--method").ok_or("--method is required")?;
    let params = match parse_flag(args, "--params") {
        Some(raw) => parse_json_array(&raw, "--params")?,
        None => Vec::new(),
    };
    let (namespace, name) = split_rpc_name(&method)
        .ok_or_else(|| format!("unknown namespace in method name: {method}"))?;

    tracing::debug!(%url, %method, params = params.len(), "sending call");
    let transport = HttpTransport::default_for(&url).map_err(|e| e.to_string())?;
    let mut web3 = Web3::new(Arc::new(transport));
    let result = web3
        .namespace(namespace)
        .request(name, params)
        .await
        .map_err(|e| e.to_string())?;

    serde_json::to_string_pretty(&result).map_err(|e| e.to_string())
}

fn cmd_selector(args: &[String]) -> Result<String, String> {
    let signature = positional(args).ok_or("a function signature is required")?;
    AbiCodec::new()
        .function_selector(signature)
        .map_err(|e| e.to_string())
}

fn cmd_topic(args: &[String]) -> Result<String, String> {
    let signature = positional(args).ok_or("an event signature is required")?;
    AbiCodec::new().event_topic(signature).map_err(|e| e.to_string())
}

fn cmd_encode(args: &[String]) -> Result<String, String> {
    let types = required_array(args, "--types")?;
    let values = required_array(args, "--values")?;
    let data = AbiCodec::new()
        .encode_json(&types, &values)
        .map_err(|e| e.to_string())?;
    Ok(format!("0x{}", hex::encode(data)))
}

fn cmd_decode(args: &[String]) -> Result<String, String> {
    let types = required_array(args, "--types")?;
    let data = parse_flag(args, "--data").ok_or("--data is required")?;
    let codec = AbiCodec::new();
    let parsed = codec.parse_json_types(&types).map_err(|e| e.to_string())?;
    let bytes = chainweb3_abi::decode_hex(&data).map_err(|e| e.to_string())?;
    let values = chainweb3_abi::decode(&parsed, &bytes).map_err(|e| e.to_string())?;
    let rendered = Value::Array(values.iter().map(AbiValue::to_json).collect());
    serde_json::to_string_pretty(&rendered).map_err(|e| e.to_string())
}

/// `eth_getBalance` → (`Eth`, `getBalance`).
fn split_rpc_name(rpc_name: &str) -> Option<(Namespace, &str)> {
    let (prefix, method) = rpc_name.split_once('_')?;
    Namespace::ALL
        .into_iter()
        .find(|ns| ns.prefix() == prefix)
        .map(|ns| (ns, method))
}

fn required_array(args: &[String], flag: &str) -> Result<Vec<Value>, String> {
    let raw = parse_flag(args, flag).ok_or_else(|| format!("{flag} is required"))?;
    parse_json_array(&raw, flag)
}

fn parse_json_array(raw: &str, flag: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(format!("{flag} must be a JSON array")),
        Err(e) => Err(format!("{flag} is not valid JSON: {e}")),
    }
}

/// Flags that take no value.
const SWITCHES: [&str; 1] = ["--log-json"];

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if SWITCHES.contains(&arg.as_str()) {
            continue;
        }
        if arg.starts_with("--") {
            iter.next();
        } else {
            return Some(arg);
        }
    }
    None
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
