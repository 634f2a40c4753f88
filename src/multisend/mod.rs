//! MultiSend batch encoding and contract resolution.
//!
//! A transaction group of size two or more cannot be hashed directly by the
//! module contract; it is first flattened into one delegatecall to the
//! MultiSend contract of the Safe contract suite. The payload layout is
//! fixed and versionless; only the address the payload is sent to differs
//! per chain and suite version.

use std::collections::HashMap;
use std::str::FromStr;

use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, U256};
use once_cell::sync::Lazy;

use crate::contracts::MultiSendCall;
use crate::errors::VerifyError;
use crate::types::{ModuleTransaction, Operation, TransactionGroup};

/// Contract-suite version families with known MultiSend deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionFamily {
    V1_3,
}

/// Reported Safe version strings classified into supported families.
/// Anything absent here is rejected, never defaulted.
const SUPPORTED_VERSIONS: [(&str, VersionFamily); 2] = [
    ("1.3.0", VersionFamily::V1_3),
    ("1.3.0+L2", VersionFamily::V1_3),
];

/// MultiSend deployments keyed by `(chain id, version family)`.
///
/// Reference data from the canonical suite deployments. Adding a chain or a
/// newly supported version is a change here, not in the resolver.
static MULTI_SEND_DEPLOYMENTS: Lazy<HashMap<(u64, VersionFamily), Address>> = Lazy::new(|| {
    let canonical = addr("0xA238CBeb142c10Ef7Ad8442C6D1f9E89e07e7761");
    let eip155 = addr("0x998739BFdAAdde7C933B942a68053933098f9EDa");

    let mut table = HashMap::new();
    for chain_id in [1, 4, 5, 56, 100, 137, 246, 42161, 43114, 73799] {
        table.insert((chain_id, VersionFamily::V1_3), canonical);
    }
    for chain_id in [10, 288, 1088] {
        table.insert((chain_id, VersionFamily::V1_3), eip155);
    }
    table
});

fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

/// Resolves the MultiSend address for a chain and a reported suite version.
///
/// Fails with [VerifyError::UnsupportedContractVersion] when either lookup
/// misses: a batch sent to the wrong address produces a digest that matches
/// nothing, so there is no safe fallback.
pub fn resolve(chain_id: u64, version: &str) -> Result<Address, VerifyError> {
    let unsupported = || VerifyError::UnsupportedContractVersion {
        version: version.to_string(),
        chain_id,
    };

    let family = SUPPORTED_VERSIONS
        .iter()
        .find(|(known, _)| *known == version)
        .map(|(_, family)| *family)
        .ok_or_else(unsupported)?;

    MULTI_SEND_DEPLOYMENTS
        .get(&(chain_id, family))
        .copied()
        .ok_or_else(unsupported)
}

/// Encodes a transaction list into the packed MultiSend payload.
///
/// Per transaction, concatenated with no separators:
/// `operation (1B) ‖ to (20B) ‖ value (32B BE) ‖ len(data) (32B BE) ‖ data`.
pub fn encode_multi_send(txs: &[ModuleTransaction]) -> Bytes {
    let mut out = Vec::new();
    let mut word = [0u8; 32];
    for tx in txs {
        out.push(tx.operation as u8);
        out.extend_from_slice(tx.to.as_bytes());
        tx.value.to_big_endian(&mut word);
        out.extend_from_slice(&word);
        U256::from(tx.data.len()).to_big_endian(&mut word);
        out.extend_from_slice(&word);
        out.extend_from_slice(&tx.data);
    }
    out.into()
}

/// Wraps a packed payload into `multiSend(bytes)` calldata.
pub fn wrap_multi_send(payload: Bytes) -> Bytes {
    MultiSendCall {
        transactions: payload,
    }
    .encode()
    .into()
}

/// Collapses a batch group into the single synthetic transaction the module
/// hashes in its place: a zero-value delegatecall to MultiSend carrying the
/// encoded batch, at the group's positional index.
pub fn flatten_group(
    group: &TransactionGroup,
    multi_send: Address,
    index: u64,
) -> ModuleTransaction {
    debug_assert!(group.is_batch());
    ModuleTransaction {
        to: multi_send,
        value: U256::zero(),
        data: wrap_multi_send(encode_multi_send(group.transactions())),
        operation: Operation::DelegateCall,
        nonce: index,
    }
}
