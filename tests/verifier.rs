use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use serde_json::json;

use snapsafe::errors::VerifyError;
use snapsafe::multisend;
use snapsafe::normalize::normalize;
use snapsafe::oracle::{FixedHasher, TransactionHasher};
use snapsafe::types::{ModuleTransaction, Operation};
use snapsafe::verifier::{proposal_digest, Verifier};

const TO_A: &str = "0x00000000000000000000000000000000000000aa";
const TO_B: &str = "0x00000000000000000000000000000000000000bb";

fn h(byte: u8) -> H256 {
    H256::repeat_byte(byte)
}

#[tokio::test]
async fn singleton_proposal_digest_is_packed_hash_of_one() {
    let raw = json!({
        "id": "prop",
        "txs": [{ "to": TO_A, "value": "0", "data": "0x", "operation": 0 }],
    });
    let proposal = normalize(&raw).unwrap();

    let verifier = Verifier::new(FixedHasher::new(vec![h(0x11)]));
    let extended = verifier.derive(proposal).await.unwrap();

    assert_eq!(extended.group_hashes, vec![h(0x11)]);
    assert_eq!(
        extended.digest,
        H256::from(keccak256(h(0x11).as_bytes()))
    );
}

#[tokio::test]
async fn three_groups_aggregate_in_order() {
    let raw = json!({
        "id": "prop",
        "txs": [
            { "to": TO_A, "value": "0", "data": "0x", "operation": 0 },
            { "to": TO_B, "value": "1", "data": "0x", "operation": 0 },
            { "to": TO_A, "value": "2", "data": "0x", "operation": 0 },
        ],
    });
    let proposal = normalize(&raw).unwrap();

    let verifier = Verifier::new(FixedHasher::new(vec![h(1), h(2), h(3)]));
    let extended = verifier.derive(proposal).await.unwrap();

    assert_eq!(extended.group_hashes, vec![h(1), h(2), h(3)]);
    assert_eq!(extended.digest, proposal_digest(&[h(1), h(2), h(3)]));
}

/// Hasher that completes later indices first, so results arriving out of
/// order would be observable.
struct ReverseCompletionHasher {
    hashes: Vec<H256>,
}

#[async_trait]
impl TransactionHasher for ReverseCompletionHasher {
    async fn transaction_hash(
        &self,
        _tx: &ModuleTransaction,
        index: u64,
    ) -> Result<H256, VerifyError> {
        let delay = 80u64.saturating_sub(20 * index);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(self.hashes[index as usize])
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn hashes_follow_group_order_despite_reversed_completion() {
    let raw = json!({
        "id": "prop",
        "txs": [
            { "to": TO_A, "value": "0", "data": "0x", "operation": 0 },
            { "to": TO_B, "value": "1", "data": "0x", "operation": 0 },
            { "to": TO_A, "value": "2", "data": "0x", "operation": 0 },
        ],
    });
    let proposal = normalize(&raw).unwrap();

    let hasher = ReverseCompletionHasher {
        hashes: vec![h(1), h(2), h(3)],
    };
    let extended = Verifier::new(hasher).derive(proposal).await.unwrap();

    // index 2 finishes first and index 0 last, but the hash list and the
    // digest still follow group order
    assert_eq!(extended.group_hashes, vec![h(1), h(2), h(3)]);
    assert_eq!(extended.digest, proposal_digest(&[h(1), h(2), h(3)]));
}

#[tokio::test]
async fn pipeline_is_idempotent() {
    let raw = json!({
        "id": "prop",
        "plugins": {
            "safeSnap": {
                "txs": [[
                    { "to": TO_A, "value": "0", "data": "0x", "operation": 0 },
                    { "to": TO_B, "value": "5", "data": "0x1234", "operation": 0 },
                ]]
            }
        }
    });
    let proposal = normalize(&raw).unwrap();

    let multi_send = multisend::resolve(1, "1.3.0").unwrap();
    let verifier = Verifier::new(FixedHasher::new(vec![h(0x42)])).with_multi_send(multi_send);

    let first = verifier.derive(proposal.clone()).await.unwrap();
    let second = verifier.derive(proposal).await.unwrap();

    assert_eq!(first.group_hashes, second.group_hashes);
    assert_eq!(first.digest, second.digest);
}

/// The concrete flattening scenario: a two-transaction group becomes one
/// delegatecall to MultiSend whose calldata wraps the packed batch payload.
#[tokio::test]
async fn batch_group_is_flattened_before_hashing() {
    let raw = json!({
        "id": "prop",
        "plugins": {
            "safeSnap": {
                "txs": [[
                    { "to": TO_A, "value": "0", "data": "0x", "operation": 0 },
                    { "to": TO_B, "value": "5", "data": "0x1234", "operation": 0 },
                ]]
            }
        }
    });
    let proposal = normalize(&raw).unwrap();
    assert_eq!(proposal.groups.len(), 1);
    assert!(proposal.groups[0].is_batch());

    let multi_send = multisend::resolve(1, "1.3.0").unwrap();
    let flat = multisend::flatten_group(&proposal.groups[0], multi_send, 0);

    assert_eq!(flat.to, multi_send);
    assert_eq!(flat.operation, Operation::DelegateCall);
    assert_eq!(flat.value, U256::zero());

    // calldata embeds the packed payload produced by the encoder
    let payload = multisend::encode_multi_send(proposal.groups[0].transactions());
    let needle: &[u8] = &payload;
    let haystack: &[u8] = &flat.data;
    assert!(haystack
        .windows(needle.len())
        .any(|window| window == needle));

    // and the pipeline hashes exactly one transaction for the group
    let verifier = Verifier::new(FixedHasher::new(vec![h(0x07)])).with_multi_send(multi_send);
    let extended = verifier.derive(proposal).await.unwrap();
    assert_eq!(extended.group_hashes.len(), 1);
}

#[tokio::test]
async fn batch_without_multisend_address_fails() {
    let raw = json!({
        "id": "prop",
        "plugins": {
            "safeSnap": {
                "txs": [[
                    { "to": TO_A, "value": "0", "data": "0x", "operation": 0 },
                    { "to": TO_B, "value": "0", "data": "0x", "operation": 0 },
                ]]
            }
        }
    });
    let proposal = normalize(&raw).unwrap();

    let verifier = Verifier::new(FixedHasher::new(vec![h(1)]));
    assert!(verifier.derive(proposal).await.is_err());
}

#[test]
fn unsupported_versions_never_resolve() {
    for version in ["1.1.1", "1.2.0", "2.0.0", ""] {
        assert!(matches!(
            multisend::resolve(1, version),
            Err(VerifyError::UnsupportedContractVersion { .. })
        ));
    }
}

#[test]
fn digest_is_packed_keccak_and_order_sensitive() {
    let hashes = [h(0xaa), h(0xbb), h(0xcc)];
    let mut packed = Vec::new();
    for hash in &hashes {
        packed.extend_from_slice(hash.as_bytes());
    }

    assert_eq!(proposal_digest(&hashes), H256::from(keccak256(packed)));
    assert_ne!(
        proposal_digest(&hashes),
        proposal_digest(&[h(0xbb), h(0xaa), h(0xcc)])
    );
}

#[test]
fn multisend_resolution_is_data_driven() {
    // same version, different chains, different deployments
    let mainnet = multisend::resolve(1, "1.3.0").unwrap();
    let gnosis = multisend::resolve(100, "1.3.0").unwrap();
    let optimism = multisend::resolve(10, "1.3.0").unwrap();

    assert_eq!(mainnet, gnosis);
    assert_ne!(mainnet, optimism);
    assert_ne!(mainnet, Address::zero());
}
