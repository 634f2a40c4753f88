//! Turns proposal source data into a canonical ordered list of transaction
//! groups.
//!
//! Proposal JSON has arrived in several incompatible shapes over time: a
//! flat `{id, txs}` object, a plugin envelope keyed by plugin name, and a
//! `safes` wrapper inside the plugin section. Shapes are tried in a fixed
//! priority order and nothing is ever coerced from one shape into another;
//! anything ambiguous fails loudly.

use std::str::FromStr;

use ethers::types::{Address, Bytes, U256};
use serde_json::{Map, Value};

use crate::errors::VerifyError;
use crate::types::{ModuleTransaction, Operation, Proposal, TransactionGroup};

/// Plugin section names recognized in a proposal envelope, in priority order.
pub const PLUGIN_SECTIONS: [&str; 2] = ["safeSnap", "daoModule"];

/// Normalizes decoded proposal JSON into a [Proposal].
///
/// Pure transform: source order is preserved exactly, with no sorting or
/// deduplication. Positional indices are assigned here from each group's
/// position in the proposal.
pub fn normalize(raw: &Value) -> Result<Proposal, VerifyError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| VerifyError::format("proposal source is not a JSON object"))?;

    // Shape 1: flat `{id, txs}`. Every transaction becomes its own
    // singleton group, so its nonce equals its position in the list.
    // The flat shape always carries an id; an envelope may not.
    if let Some(txs) = obj.get("txs") {
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| VerifyError::format("proposal `id` is missing or not a string"))?
            .to_string();
        let txs = txs
            .as_array()
            .ok_or_else(|| VerifyError::format("`txs` is not an array"))?;
        if txs.is_empty() {
            return Err(VerifyError::format("proposal contains no transactions"));
        }
        let groups = txs
            .iter()
            .enumerate()
            .map(|(index, tx)| parse_transaction(tx, index).map(TransactionGroup::single))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Proposal { id, groups });
    }

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Shape 2: plugin envelope. Sections live under a `plugins` object; an
    // envelope without any recognized section is its own error so the caller
    // can tell "new plugin name" apart from "not a proposal at all".
    if let Some(plugins) = obj.get("plugins") {
        let plugins = plugins
            .as_object()
            .ok_or_else(|| VerifyError::format("`plugins` is not an object"))?;
        let section = find_plugin_section(plugins).ok_or_else(|| {
            VerifyError::UnknownPluginSection {
                tried: PLUGIN_SECTIONS.iter().map(|s| s.to_string()).collect(),
            }
        })?;
        let groups = groups_from_section(section)?;
        return Ok(Proposal { id, groups });
    }

    // Some sources put the plugin sections at the top level with no
    // `plugins` wrapper.
    if let Some(section) = find_plugin_section(obj) {
        let groups = groups_from_section(section)?;
        return Ok(Proposal { id, groups });
    }

    Err(VerifyError::format(
        "no `txs` list, `plugins` envelope or plugin section found",
    ))
}

fn find_plugin_section(obj: &Map<String, Value>) -> Option<&Value> {
    PLUGIN_SECTIONS.iter().find_map(|name| obj.get(*name))
}

/// Interprets the inside of a plugin section.
///
/// Tried in order: a `safes` wrapper whose first entry carries the
/// list-of-lists, then a bare `txs` field. A `txs` array is read by the JSON
/// type of its first element: inner arrays are one group each, objects form
/// a single group holding every transaction.
fn groups_from_section(section: &Value) -> Result<Vec<TransactionGroup>, VerifyError> {
    if let Some(safes) = section.get("safes") {
        let first = safes
            .as_array()
            .and_then(|entries| entries.first())
            .ok_or_else(|| VerifyError::format("`safes` wrapper is empty"))?;
        let txs = first
            .get("txs")
            .ok_or_else(|| VerifyError::format("`safes` entry has no `txs`"))?;
        return nested_groups(txs);
    }

    let txs = section
        .get("txs")
        .ok_or_else(|| VerifyError::format("plugin section has no `txs`"))?;
    let entries = txs
        .as_array()
        .ok_or_else(|| VerifyError::format("plugin `txs` is not an array"))?;

    match entries.first() {
        Some(Value::Array(_)) => nested_groups(txs),
        Some(Value::Object(_)) => {
            let group = parse_group(entries, 0)?;
            Ok(vec![group])
        }
        Some(_) => Err(VerifyError::format(
            "plugin `txs` entries are neither transaction objects nor lists",
        )),
        None => Err(VerifyError::format("proposal contains no transactions")),
    }
}

/// Parses a list-of-lists, one group per inner list.
fn nested_groups(txs: &Value) -> Result<Vec<TransactionGroup>, VerifyError> {
    let lists = txs
        .as_array()
        .ok_or_else(|| VerifyError::format("grouped `txs` is not an array"))?;
    if lists.is_empty() {
        return Err(VerifyError::format("proposal contains no transactions"));
    }
    lists
        .iter()
        .enumerate()
        .map(|(index, inner)| {
            let inner = inner.as_array().ok_or_else(|| {
                VerifyError::format(format!("group {index} is not a transaction list"))
            })?;
            parse_group(inner, index)
        })
        .collect()
}

/// Parses one group's transactions; every transaction carries the group's
/// positional index as its nonce.
fn parse_group(entries: &[Value], index: usize) -> Result<TransactionGroup, VerifyError> {
    let txs = entries
        .iter()
        .map(|tx| parse_transaction(tx, index))
        .collect::<Result<Vec<_>, _>>()?;
    TransactionGroup::new(txs)
        .ok_or_else(|| VerifyError::format(format!("group {index} is empty")))
}

fn parse_transaction(raw: &Value, group: usize) -> Result<ModuleTransaction, VerifyError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| VerifyError::format("transaction entry is not an object"))?;

    Ok(ModuleTransaction {
        to: parse_address(field(obj, "to")?)?,
        value: parse_value(field(obj, "value")?, group)?,
        data: parse_data(field(obj, "data")?)?,
        operation: parse_operation(field(obj, "operation")?)?,
        nonce: group as u64,
    })
}

fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, VerifyError> {
    obj.get(name)
        .ok_or_else(|| VerifyError::format(format!("transaction is missing `{name}`")))
}

fn parse_address(raw: &Value) -> Result<Address, VerifyError> {
    let s = raw
        .as_str()
        .ok_or_else(|| VerifyError::format("`to` is not a string"))?;
    Address::from_str(s).map_err(|_| VerifyError::format(format!("invalid address `{s}`")))
}

/// Accepts a decimal string, a 0x-hex string or a JSON number. A string of
/// valid digits that does not fit 256 bits is an overflow, not a format
/// error.
fn parse_value(raw: &Value, group: usize) -> Result<U256, VerifyError> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| VerifyError::format(format!("`value` is not an unsigned integer: {n}"))),
        Value::String(s) => {
            if let Some(digits) = s.strip_prefix("0x") {
                if digits.len() > 64 {
                    return Err(VerifyError::EncodingOverflow {
                        field: "value",
                        group,
                        detail: s.clone(),
                    });
                }
                U256::from_str_radix(digits, 16)
                    .map_err(|_| VerifyError::format(format!("invalid hex `value` `{s}`")))
            } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                U256::from_dec_str(s).map_err(|_| VerifyError::EncodingOverflow {
                    field: "value",
                    group,
                    detail: s.clone(),
                })
            } else {
                Err(VerifyError::format(format!("invalid `value` `{s}`")))
            }
        }
        other => Err(VerifyError::format(format!("`value` has type {other}"))),
    }
}

fn parse_data(raw: &Value) -> Result<Bytes, VerifyError> {
    let s = raw
        .as_str()
        .ok_or_else(|| VerifyError::format("`data` is not a string"))?;
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped)
        .map(Into::into)
        .map_err(|_| VerifyError::format(format!("invalid hex `data` `{s}`")))
}

fn parse_operation(raw: &Value) -> Result<Operation, VerifyError> {
    let n = raw
        .as_u64()
        .ok_or_else(|| VerifyError::format("`operation` is not an integer"))?;
    Operation::try_from(n)
        .map_err(|other| VerifyError::format(format!("invalid operation `{other}`")))
}
