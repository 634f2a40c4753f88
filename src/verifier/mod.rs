//! Pipeline orchestration and digest aggregation.
//!
//! Data flows one way: normalized groups are flattened where needed, each
//! group's hash is obtained from the oracle, and the ordered hash list is
//! folded into the proposal digest. The whole pipeline is a pure, idempotent
//! function of the proposal data and the oracle's responses; there is no
//! partial result.

use ethers::types::{Address, H256};
use ethers::utils::keccak256;
use futures::future::try_join_all;

use crate::errors::VerifyError;
use crate::multisend;
use crate::oracle::TransactionHasher;
use crate::types::{ExtendedProposal, ModuleTransaction, Proposal, TransactionGroup};

/// Derives per-group hashes and the proposal digest.
pub struct Verifier<H> {
    hasher: H,
    /// Resolved MultiSend address; only required when the proposal contains
    /// a batch group.
    multi_send: Option<Address>,
}

impl<H: TransactionHasher> Verifier<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            multi_send: None,
        }
    }

    pub fn with_multi_send(mut self, multi_send: Address) -> Self {
        self.multi_send = Some(multi_send);
        self
    }

    /// Runs the full derivation for one proposal.
    ///
    /// Hash calls are independent read-only calls and run concurrently;
    /// `try_join_all` yields results in input order, so the hash list always
    /// follows group order regardless of completion order.
    pub async fn derive(&self, proposal: Proposal) -> Result<ExtendedProposal, VerifyError> {
        let flattened = proposal
            .groups
            .iter()
            .enumerate()
            .map(|(index, group)| self.group_transaction(group, index as u64))
            .collect::<Result<Vec<_>, _>>()?;

        let group_hashes = try_join_all(
            flattened
                .iter()
                .map(|tx| self.hasher.transaction_hash(tx, tx.nonce)),
        )
        .await?;

        let digest = proposal_digest(&group_hashes);
        tracing::debug!(
            target: "snapsafe",
            "derived digest {:?} over {} group(s) for proposal {}",
            digest,
            group_hashes.len(),
            proposal.id,
        );

        Ok(ExtendedProposal {
            proposal,
            group_hashes,
            digest,
        })
    }

    /// The transaction actually hashed for a group: the lone member for a
    /// singleton, a synthetic MultiSend delegatecall for a batch.
    fn group_transaction(
        &self,
        group: &TransactionGroup,
        index: u64,
    ) -> Result<ModuleTransaction, VerifyError> {
        if !group.is_batch() {
            return Ok(group.transactions()[0].clone());
        }
        let multi_send = self.multi_send.ok_or_else(|| {
            VerifyError::external(
                "resolveMultiSend",
                format!("group {index} is a batch but no MultiSend address was resolved"),
            )
        })?;
        Ok(multisend::flatten_group(group, multi_send, index))
    }
}

/// The final proposal digest: keccak256 over the per-group hashes packed in
/// order, the solidity `bytes32[]` packed encoding (no length prefix, no
/// padding).
pub fn proposal_digest(hashes: &[H256]) -> H256 {
    let mut packed = Vec::with_capacity(hashes.len() * 32);
    for hash in hashes {
        packed.extend_from_slice(hash.as_bytes());
    }
    H256::from(keccak256(packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_keccak_of_packed_hashes() {
        let h0 = H256::repeat_byte(0x01);
        let h1 = H256::repeat_byte(0x02);
        let h2 = H256::repeat_byte(0x03);

        let mut packed = Vec::new();
        packed.extend_from_slice(h0.as_bytes());
        packed.extend_from_slice(h1.as_bytes());
        packed.extend_from_slice(h2.as_bytes());

        assert_eq!(
            proposal_digest(&[h0, h1, h2]),
            H256::from(keccak256(packed))
        );
    }

    #[test]
    fn digest_depends_on_hash_order() {
        let h0 = H256::repeat_byte(0x01);
        let h1 = H256::repeat_byte(0x02);

        assert_ne!(proposal_digest(&[h0, h1]), proposal_digest(&[h1, h0]));
    }
}
