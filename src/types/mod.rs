use ethers::types::{Address, Bytes, H256, U256};
use serde::{Serialize, Serializer};

/// The call type the Safe uses when executing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

impl TryFrom<u64> for Operation {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::DelegateCall),
            other => Err(other),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// A single transaction as the module contract hashes it.
///
/// `nonce` is the zero-based position of the enclosing group within the
/// proposal, assigned during normalization. It is never read from source
/// data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub nonce: u64,
}

/// An ordered, non-empty run of transactions hashed as one unit.
///
/// A group of size one is hashed as an ordinary call; a larger group is
/// first flattened into a single MultiSend delegatecall. Order is fixed at
/// normalization time and significant for the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionGroup(Vec<ModuleTransaction>);

impl TransactionGroup {
    /// Returns `None` for an empty transaction list.
    pub fn new(txs: Vec<ModuleTransaction>) -> Option<Self> {
        (!txs.is_empty()).then_some(Self(txs))
    }

    pub fn single(tx: ModuleTransaction) -> Self {
        Self(vec![tx])
    }

    pub fn transactions(&self) -> &[ModuleTransaction] {
        &self.0
    }

    /// Whether this group must be flattened through MultiSend before hashing.
    pub fn is_batch(&self) -> bool {
        self.0.len() > 1
    }
}

/// A normalized proposal: an opaque id and its ordered transaction groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub id: String,
    pub groups: Vec<TransactionGroup>,
}

/// A proposal together with its derived per-group hashes and final digest.
///
/// `group_hashes` has the same length and order as `proposal.groups`.
/// Derived once per verification run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedProposal {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub group_hashes: Vec<H256>,
    pub digest: H256,
}
