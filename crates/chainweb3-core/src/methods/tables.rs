//! Static allow-lists, one per namespace.

use serde_json::Value;

use super::{MethodSpec, Param};
use crate::formatters::{InputFormatter as In, OutputFormatter as Out};
use crate::validators::ParamValidator as V;

fn latest() -> Value {
    Value::from("latest")
}

fn no() -> Value {
    Value::Bool(false)
}

const fn address(name: &'static str) -> Param {
    Param::new(name, V::Address, In::Address)
}

const fn quantity(name: &'static str) -> Param {
    Param::new(name, V::Quantity, In::Quantity)
}

const fn block(name: &'static str) -> Param {
    Param::new(name, V::BlockTag, In::BlockTag)
}

const fn hash(name: &'static str) -> Param {
    Param::new(name, V::Hash, In::Raw)
}

const fn text(name: &'static str) -> Param {
    Param::new(name, V::Text, In::Raw)
}

const fn full_tx() -> Param {
    Param::new("fullTransactions", V::Boolean, In::Boolean).or(no)
}

const ADDRESS_AT_BLOCK: &[Param] = &[address("address"), block("block").or(latest)];
const BLOCK_HASH: &[Param] = &[hash("blockHash")];
const BLOCK_NUMBER: &[Param] = &[block("block").or(latest)];
const TX_HASH: &[Param] = &[hash("transactionHash")];
const FILTER_ID: &[Param] = &[quantity("filterId")];

pub static WEB3: &[MethodSpec] = &[
    MethodSpec::new("clientVersion", &[], Out::Raw),
    MethodSpec::new("sha3", &[Param::new("data", V::Text, In::Hex)], Out::Raw),
];

pub static NET: &[MethodSpec] = &[
    MethodSpec::new("version", &[], Out::Raw),
    MethodSpec::new("peerCount", &[], Out::Quantity),
    MethodSpec::new("listening", &[], Out::Boolean),
];

pub static ETH: &[MethodSpec] = &[
    MethodSpec::new("protocolVersion", &[], Out::Raw),
    MethodSpec::new("syncing", &[], Out::Raw),
    MethodSpec::new("coinbase", &[], Out::Raw),
    MethodSpec::new("mining", &[], Out::Boolean),
    MethodSpec::new("hashrate", &[], Out::Quantity),
    MethodSpec::new("gasPrice", &[], Out::Quantity),
    MethodSpec::new("accounts", &[], Out::Raw),
    MethodSpec::new("blockNumber", &[], Out::Quantity),
    MethodSpec::new("getBalance", ADDRESS_AT_BLOCK, Out::Quantity),
    MethodSpec::new(
        "getStorageAt",
        &[address("address"), quantity("position"), block("block").or(latest)],
        Out::Raw,
    ),
    MethodSpec::new("getTransactionCount", ADDRESS_AT_BLOCK, Out::Quantity),
    MethodSpec::new("getBlockTransactionCountByHash", BLOCK_HASH, Out::Quantity),
    MethodSpec::new("getBlockTransactionCountByNumber", BLOCK_NUMBER, Out::Quantity),
    MethodSpec::new("getUncleCountByBlockHash", BLOCK_HASH, Out::Quantity),
    MethodSpec::new("getUncleCountByBlockNumber", BLOCK_NUMBER, Out::Quantity),
    MethodSpec::new("getCode", ADDRESS_AT_BLOCK, Out::Raw),
    MethodSpec::new(
        "sign",
        &[address("address"), Param::new("message", V::Text, In::Hex)],
        Out::Raw,
    ),
    MethodSpec::new(
        "sendTransaction",
        &[Param::new("transaction", V::Transaction, In::Transaction)],
        Out::Raw,
    ),
    MethodSpec::new(
        "sendRawTransaction",
        &[Param::new("data", V::Hex, In::Raw)],
        Out::Raw,
    ),
    MethodSpec::new(
        "call",
        &[Param::new("call", V::Call, In::Transaction), block("block").or(latest)],
        Out::Raw,
    ),
    MethodSpec::new(
        "estimateGas",
        &[Param::new("call", V::Call, In::Transaction)],
        Out::Quantity,
    ),
    MethodSpec::new("getBlockByHash", &[hash("blockHash"), full_tx()], Out::Raw),
    MethodSpec::new("getBlockByNumber", &[block("block"), full_tx()], Out::Raw),
    MethodSpec::new("getTransactionByHash", TX_HASH, Out::Raw),
    MethodSpec::new(
        "getTransactionByBlockHashAndIndex",
        &[hash("blockHash"), quantity("index")],
        Out::Raw,
    ),
    MethodSpec::new(
        "getTransactionByBlockNumberAndIndex",
        &[block("block"), quantity("index")],
        Out::Raw,
    ),
    MethodSpec::new("getTransactionReceipt", TX_HASH, Out::Raw),
    MethodSpec::new(
        "getUncleByBlockHashAndIndex",
        &[hash("blockHash"), quantity("index")],
        Out::Raw,
    ),
    MethodSpec::new(
        "getUncleByBlockNumberAndIndex",
        &[block("block"), quantity("index")],
        Out::Raw,
    ),
    MethodSpec::new(
        "newFilter",
        &[Param::new("filter", V::Filter, In::Filter)],
        Out::Raw,
    ),
    MethodSpec::new("newBlockFilter", &[], Out::Raw),
    MethodSpec::new("newPendingTransactionFilter", &[], Out::Raw),
    MethodSpec::new("uninstallFilter", FILTER_ID, Out::Boolean),
    MethodSpec::new("getFilterChanges", FILTER_ID, Out::Raw),
    MethodSpec::new("getFilterLogs", FILTER_ID, Out::Raw),
    MethodSpec::new(
        "getLogs",
        &[Param::new("filter", V::Filter, In::Filter)],
        Out::Raw,
    ),
    MethodSpec::new("getWork", &[], Out::Raw),
    MethodSpec::new(
        "submitWork",
        &[
            Param::new("nonce", V::Hex, In::Raw),
            hash("powHash"),
            hash("mixDigest"),
        ],
        Out::Boolean,
    ),
    MethodSpec::new(
        "submitHashrate",
        &[hash("hashrate"), hash("clientId")],
        Out::Boolean,
    ),
];

pub static PERSONAL: &[MethodSpec] = &[
    MethodSpec::new("listAccounts", &[], Out::Raw),
    MethodSpec::new("newAccount", &[text("password")], Out::Raw),
    MethodSpec::new(
        "unlockAccount",
        &[
            address("address"),
            text("password"),
            Param::new("duration", V::Quantity, In::Raw),
        ],
        Out::Boolean,
    ),
    MethodSpec::new("lockAccount", &[address("address")], Out::Boolean),
    MethodSpec::new(
        "sendTransaction",
        &[
            Param::new("transaction", V::Transaction, In::Transaction),
            text("password"),
        ],
        Out::Raw,
    ),
];

pub static SHH: &[MethodSpec] = &[
    MethodSpec::new("version", &[], Out::Raw),
    MethodSpec::new("newIdentity", &[], Out::Raw),
    MethodSpec::new(
        "hasIdentity",
        &[Param::new("identity", V::Identity, In::Raw)],
        Out::Boolean,
    ),
    MethodSpec::new("post", &[Param::new("post", V::Post, In::Post)], Out::Boolean),
    MethodSpec::new(
        "newFilter",
        &[Param::new("filter", V::ShhFilter, In::Raw)],
        Out::Raw,
    ),
    MethodSpec::new("uninstallFilter", FILTER_ID, Out::Boolean),
    MethodSpec::new("getFilterChanges", FILTER_ID, Out::Raw),
    MethodSpec::new("getMessages", FILTER_ID, Out::Raw),
];
